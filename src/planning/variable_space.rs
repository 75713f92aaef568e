// Admissible decision variables.
//
// A tuple `(product, line, area, format, size)` becomes a variable only when
// the format is offered for the size, the line accepts the size, the product
// may be packed in the area, and the product is allowed on the line. Tuples
// failing any test are never generated, so the model needs no indicator
// constraints and no big-M terms.

use crate::domain::{Assignment, ParameterStore};

/// Lazy view over the admissible tuples of a parameter snapshot.
///
/// [`VariableSpace::iter`] can be called any number of times; each call
/// restarts the enumeration and nothing is materialized.
#[derive(Debug, Clone, Copy)]
pub struct VariableSpace<'a> {
    params: &'a ParameterStore,
}

impl<'a> VariableSpace<'a> {
    pub fn new(params: &'a ParameterStore) -> Self {
        Self { params }
    }

    /// Admissible tuples in (product, line, area, format, size) order.
    pub fn iter(&self) -> impl Iterator<Item = Assignment> + 'a {
        let params = self.params;
        let num_lines = params.lines().len();
        let num_areas = params.areas().len();
        let num_formats = params.formats().len();
        let num_sizes = params.sizes().len();

        (0..params.products().len()).flat_map(move |product| {
            (0..num_lines)
                .filter(move |&line| params.product_allowed_on(product, line))
                .flat_map(move |line| {
                    (0..num_areas)
                        .filter(move |&area| params.area_accepts(product, area))
                        .flat_map(move |area| {
                            (0..num_formats).flat_map(move |format| {
                                (0..num_sizes)
                                    .filter(move |&size| {
                                        params.pieces_per_box(format, size) > 0
                                            && params.line_accepts(line, size)
                                    })
                                    .map(move |size| Assignment {
                                        product,
                                        line,
                                        area,
                                        format,
                                        size,
                                    })
                            })
                        })
                })
        })
    }

    /// Checks one tuple against every admission rule.
    pub fn contains(&self, a: &Assignment) -> bool {
        let params = self.params;
        a.product < params.products().len()
            && a.line < params.lines().len()
            && a.area < params.areas().len()
            && params.pieces_per_box(a.format, a.size) > 0
            && params.line_accepts(a.line, a.size)
            && params.area_accepts(a.product, a.area)
            && params.product_allowed_on(a.product, a.line)
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Size of the unfiltered Cartesian product, for logging.
    pub fn cartesian_len(&self) -> usize {
        let p = self.params;
        p.products().len() * p.lines().len() * p.areas().len() * p.formats().len() * p.sizes().len()
    }

    /// Size classes that no admissible tuple touches.
    pub fn uncovered_sizes(&self) -> Vec<usize> {
        let mut covered = vec![false; self.params.sizes().len()];
        for a in self.iter() {
            covered[a.size] = true;
        }
        (0..covered.len()).filter(|&i| !covered[i]).collect()
    }
}
