// Immutable planning parameters.
//
// A `ParameterStore` is a validated snapshot of every static planning
// parameter: the product, line, packing-area, box-format and size-class sets,
// their capacities and economics, and both compatibility matrices. All ids are
// resolved to dense indices once, here, so the model builders only ever work
// with `usize` positions.
//
// Snapshots are never edited in place. The `with_*` methods return a new
// store with a bumped `ParameterStore::version`.

use super::allocator::{PlanningError, Result};
use super::value_objects::{AllocationStrategy, SolverBackend};
use std::collections::HashSet;
use std::path::PathBuf;

/// Floor applied to yield and pieces-per-unit before dividing by them.
pub const EPSILON: f64 = 1e-9;

/// Pounds per kilogram.
pub const LB_PER_KG: f64 = 2.20462;

/// Mass ceiling of the mass-limited packing area when none is configured.
pub const DEFAULT_MASS_CEILING_KG: f64 = 22_500.0;

/// Size-class labels used when the configuration does not provide its own map.
pub const DEFAULT_SIZE_LABELS: [&str; 14] = [
    "1-2", "2-3", "3-4", "4-5", "5-6", "6-7", "7-8", "8-9", "9-10", "10-11", "11-12", "12-13",
    "13-14", "14+",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub priority_weight: f64,
    pub yield_fraction: f64,
    pub pieces_per_unit: f64,
    /// Price per box, indexed by box format.
    pub prices: Vec<f64>,
}

impl Product {
    /// Raw units consumed per produced piece.
    pub fn units_per_piece(&self) -> f64 {
        1.0 / (self.pieces_per_unit * self.yield_fraction).max(EPSILON)
    }

    /// Sellable kilograms per produced piece for a unit of `avg_unit_weight_lb`.
    pub fn kg_per_piece(&self, avg_unit_weight_lb: f64) -> f64 {
        avg_unit_weight_lb * self.yield_fraction / self.pieces_per_unit.max(EPSILON) / LB_PER_KG
    }

    pub fn price(&self, format: usize) -> f64 {
        self.prices.get(format).copied().unwrap_or(0.0)
    }

    /// Objective coefficient of one box in `format`.
    pub fn box_value(&self, format: usize) -> f64 {
        self.priority_weight * self.price(format)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: String,
    /// Pieces per shift.
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackingArea {
    pub id: String,
    /// Pieces per shift.
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxFormat {
    pub id: String,
    /// Pieces per box, indexed by size class. Zero means "not offered".
    pub pieces_per_box: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeClass {
    pub index: usize,
    pub label: String,
    pub avg_unit_weight_lb: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassLimit {
    pub area: usize,
    pub ceiling_kg: f64,
}

/// Dense boolean matrix, `rows × cols`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityMatrix {
    cols: usize,
    cells: Vec<bool>,
}

impl CompatibilityMatrix {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            cells: vec![false; rows * cols],
        }
    }

    pub fn all(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            cells: vec![true; rows * cols],
        }
    }

    pub fn allow(&mut self, row: usize, col: usize) {
        self.cells[row * self.cols + col] = true;
    }

    pub fn allows(&self, row: usize, col: usize) -> bool {
        self.cells
            .get(row * self.cols + col)
            .copied()
            .unwrap_or(false)
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.cols).filter(move |&c| self.allows(row, c))
    }
}

/// Knobs for the greedy allocator, already resolved to indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicSettings {
    pub default_product: Option<usize>,
    /// Weighted round-robin sequence, expanded (`A×2, B×1` becomes `[A, A, B]`).
    pub rotation: Vec<usize>,
    /// Packing areas per product in priority order.
    pub area_priority: Vec<Vec<usize>>,
    pub preferred_format: Vec<Option<usize>>,
}

/// Run-level settings: which allocator to use and how to drive the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerSettings {
    pub strategy: AllocationStrategy,
    pub backend: SolverBackend,
    pub time_limit_secs: Option<f64>,
    pub mip_gap: Option<f64>,
    pub diagnostics_dir: PathBuf,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            strategy: AllocationStrategy::Exact,
            backend: SolverBackend::Auto,
            time_limit_secs: None,
            mip_gap: None,
            diagnostics_dir: PathBuf::from("logs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    version: u64,
    products: Vec<Product>,
    lines: Vec<Line>,
    areas: Vec<PackingArea>,
    formats: Vec<BoxFormat>,
    sizes: Vec<SizeClass>,
    line_sizes: CompatibilityMatrix,
    product_areas: CompatibilityMatrix,
    mass_limit: Option<MassLimit>,
    exclusive_lines: Vec<Option<usize>>,
    heuristic: HeuristicSettings,
    settings: PlannerSettings,
    diagnostics: Vec<String>,
}

impl ParameterStore {
    pub fn builder() -> ParameterStoreBuilder {
        ParameterStoreBuilder::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn areas(&self) -> &[PackingArea] {
        &self.areas
    }

    pub fn formats(&self) -> &[BoxFormat] {
        &self.formats
    }

    pub fn sizes(&self) -> &[SizeClass] {
        &self.sizes
    }

    pub fn mass_limit(&self) -> Option<MassLimit> {
        self.mass_limit
    }

    pub fn heuristic(&self) -> &HeuristicSettings {
        &self.heuristic
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Numeric-guard notes raised while validating the configuration.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn pieces_per_box(&self, format: usize, size: usize) -> u32 {
        self.formats
            .get(format)
            .and_then(|f| f.pieces_per_box.get(size))
            .copied()
            .unwrap_or(0)
    }

    pub fn line_accepts(&self, line: usize, size: usize) -> bool {
        self.line_sizes.allows(line, size)
    }

    pub fn area_accepts(&self, product: usize, area: usize) -> bool {
        self.product_areas.allows(product, area)
    }

    /// Whether the exclusion rule lets `product` run on `line`.
    pub fn product_allowed_on(&self, product: usize, line: usize) -> bool {
        match self.exclusive_lines.get(product).copied().flatten() {
            Some(only) => only == line,
            None => true,
        }
    }

    pub fn size_index(&self, label: &str) -> Option<usize> {
        self.sizes.iter().position(|s| s.label == label)
    }

    pub fn product_index(&self, id: &str) -> Option<usize> {
        self.products.iter().position(|p| p.id == id)
    }

    pub fn format_index(&self, id: &str) -> Option<usize> {
        self.formats.iter().position(|f| f.id == id)
    }

    pub fn line_index(&self, id: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.id == id)
    }

    pub fn area_index(&self, id: &str) -> Option<usize> {
        self.areas.iter().position(|a| a.id == id)
    }

    /// New snapshot with one line capacity replaced.
    pub fn with_line_capacity(&self, line: &str, capacity: f64) -> Result<Self> {
        check_capacity(line, capacity)?;
        let idx = self
            .line_index(line)
            .ok_or_else(|| PlanningError::Configuration(format!("Unknown line '{}'", line)))?;
        let mut next = self.next_version();
        next.lines[idx].capacity = capacity;
        Ok(next)
    }

    /// New snapshot with one packing-area capacity replaced.
    pub fn with_area_capacity(&self, area: &str, capacity: f64) -> Result<Self> {
        check_capacity(area, capacity)?;
        let idx = self.area_index(area).ok_or_else(|| {
            PlanningError::Configuration(format!("Unknown packing area '{}'", area))
        })?;
        let mut next = self.next_version();
        next.areas[idx].capacity = capacity;
        Ok(next)
    }

    /// New snapshot with different run settings (strategy, backend, limits).
    pub fn with_settings(&self, settings: PlannerSettings) -> Self {
        let mut next = self.next_version();
        next.settings = settings;
        next
    }

    fn next_version(&self) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next
    }
}

fn check_capacity(what: &str, capacity: f64) -> Result<()> {
    if !capacity.is_finite() || capacity < 0.0 {
        return Err(PlanningError::Configuration(format!(
            "Capacity of '{}' must be a finite number >= 0 (got {})",
            what, capacity
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct ProductSpec {
    id: String,
    priority_weight: f64,
    yield_fraction: f64,
    pieces_per_unit: f64,
}

/// Collects raw, id-keyed parameters and validates them into a
/// [`ParameterStore`].
#[derive(Debug, Clone, Default)]
pub struct ParameterStoreBuilder {
    size_labels: Option<Vec<String>>,
    unit_weights: Vec<(usize, f64)>,
    products: Vec<ProductSpec>,
    prices: Vec<(String, String, f64)>,
    lines: Vec<(String, f64)>,
    areas: Vec<(String, f64)>,
    formats: Vec<String>,
    pieces_per_box: Vec<(String, usize, u32)>,
    line_sizes: Vec<(String, usize)>,
    product_areas: Option<Vec<(String, String)>>,
    mass_limit: Option<(String, f64)>,
    exclusive_lines: Vec<(String, String)>,
    default_product: Option<String>,
    rotation: Vec<(String, u32)>,
    area_priority: Vec<(String, Vec<String>)>,
    preferred_format: Vec<(String, String)>,
    settings: PlannerSettings,
}

impl ParameterStoreBuilder {
    /// Replace the default 14 size labels; index `i` gets `labels[i]`.
    pub fn size_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.size_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn unit_weight(mut self, size: usize, avg_unit_weight_lb: f64) -> Self {
        self.unit_weights.push((size, avg_unit_weight_lb));
        self
    }

    pub fn product(
        mut self,
        id: impl Into<String>,
        priority_weight: f64,
        yield_fraction: f64,
        pieces_per_unit: f64,
    ) -> Self {
        self.products.push(ProductSpec {
            id: id.into(),
            priority_weight,
            yield_fraction,
            pieces_per_unit,
        });
        self
    }

    pub fn price(
        mut self,
        product: impl Into<String>,
        format: impl Into<String>,
        price: f64,
    ) -> Self {
        self.prices.push((product.into(), format.into(), price));
        self
    }

    pub fn line(mut self, id: impl Into<String>, capacity: f64) -> Self {
        self.lines.push((id.into(), capacity));
        self
    }

    pub fn area(mut self, id: impl Into<String>, capacity: f64) -> Self {
        self.areas.push((id.into(), capacity));
        self
    }

    pub fn format(mut self, id: impl Into<String>) -> Self {
        self.formats.push(id.into());
        self
    }

    pub fn pieces_per_box(mut self, format: impl Into<String>, size: usize, pieces: u32) -> Self {
        self.pieces_per_box.push((format.into(), size, pieces));
        self
    }

    pub fn line_accepts(mut self, line: impl Into<String>, size: usize) -> Self {
        self.line_sizes.push((line.into(), size));
        self
    }

    /// Restrict a product to listed areas. Once any pair is given, products
    /// without pairs may not be packed anywhere; with none, every area is open.
    pub fn product_area(mut self, product: impl Into<String>, area: impl Into<String>) -> Self {
        self.product_areas
            .get_or_insert_with(Vec::new)
            .push((product.into(), area.into()));
        self
    }

    /// Switch to explicit area lists without adding a pair.
    pub fn restrict_product_areas(mut self) -> Self {
        self.product_areas.get_or_insert_with(Vec::new);
        self
    }

    pub fn mass_limit(mut self, area: impl Into<String>, ceiling_kg: f64) -> Self {
        self.mass_limit = Some((area.into(), ceiling_kg));
        self
    }

    pub fn exclusive_line(mut self, product: impl Into<String>, line: impl Into<String>) -> Self {
        self.exclusive_lines.push((product.into(), line.into()));
        self
    }

    pub fn default_product(mut self, product: impl Into<String>) -> Self {
        self.default_product = Some(product.into());
        self
    }

    pub fn rotation_step(mut self, product: impl Into<String>, weight: u32) -> Self {
        self.rotation.push((product.into(), weight));
        self
    }

    pub fn area_priority<I, S>(mut self, product: impl Into<String>, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.area_priority
            .push((product.into(), areas.into_iter().map(Into::into).collect()));
        self
    }

    pub fn preferred_format(
        mut self,
        product: impl Into<String>,
        format: impl Into<String>,
    ) -> Self {
        self.preferred_format.push((product.into(), format.into()));
        self
    }

    pub fn settings(mut self, settings: PlannerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Result<ParameterStore> {
        let mut diagnostics = Vec::new();

        require_non_empty("products", self.products.len())?;
        require_non_empty("lines", self.lines.len())?;
        require_non_empty("packing_areas", self.areas.len())?;
        require_non_empty("box_formats", self.formats.len())?;

        let labels: Vec<String> = match self.size_labels {
            Some(labels) => labels,
            None => DEFAULT_SIZE_LABELS.iter().map(|s| s.to_string()).collect(),
        };
        require_non_empty("size_classes", labels.len())?;
        require_unique("size_classes", labels.iter())?;
        let mut sizes: Vec<SizeClass> = labels
            .into_iter()
            .enumerate()
            .map(|(index, label)| SizeClass {
                index,
                label,
                avg_unit_weight_lb: 0.0,
            })
            .collect();
        for (size, weight) in self.unit_weights {
            let slot = sizes.get_mut(size).ok_or_else(|| unknown("size index", &size))?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(PlanningError::Configuration(format!(
                    "avg_unit_weight_lb for size {} must be >= 0 (got {})",
                    size, weight
                )));
            }
            slot.avg_unit_weight_lb = weight;
        }

        require_unique("box_formats", self.formats.iter())?;
        let mut formats: Vec<BoxFormat> = self
            .formats
            .into_iter()
            .map(|id| BoxFormat {
                id,
                pieces_per_box: vec![0; sizes.len()],
            })
            .collect();
        for (format, size, pieces) in self.pieces_per_box {
            let f = formats
                .iter_mut()
                .find(|f| f.id == format)
                .ok_or_else(|| unknown("box format", &format))?;
            let slot = f
                .pieces_per_box
                .get_mut(size)
                .ok_or_else(|| unknown("size index", &size))?;
            *slot = pieces;
        }

        require_unique("lines", self.lines.iter().map(|(id, _)| id))?;
        let mut lines = Vec::with_capacity(self.lines.len());
        for (id, capacity) in self.lines {
            check_capacity(&id, capacity)?;
            lines.push(Line { id, capacity });
        }

        require_unique("packing_areas", self.areas.iter().map(|(id, _)| id))?;
        let mut areas = Vec::with_capacity(self.areas.len());
        for (id, capacity) in self.areas {
            check_capacity(&id, capacity)?;
            areas.push(PackingArea { id, capacity });
        }

        require_unique("products", self.products.iter().map(|p| &p.id))?;
        let mut products = Vec::with_capacity(self.products.len());
        for spec in self.products {
            if !spec.yield_fraction.is_finite() || !(0.0..=1.0).contains(&spec.yield_fraction) {
                return Err(PlanningError::Configuration(format!(
                    "yield of '{}' must be within (0, 1] (got {})",
                    spec.id, spec.yield_fraction
                )));
            }
            if !spec.pieces_per_unit.is_finite() || spec.pieces_per_unit < 0.0 {
                return Err(PlanningError::Configuration(format!(
                    "pieces_per_unit of '{}' must be > 0 (got {})",
                    spec.id, spec.pieces_per_unit
                )));
            }
            if !spec.priority_weight.is_finite() {
                return Err(PlanningError::Configuration(format!(
                    "priority_weight of '{}' must be finite",
                    spec.id
                )));
            }
            if spec.yield_fraction == 0.0 {
                diagnostics.push(format!(
                    "Numeric guard: yield of '{}' is 0; \
                     floored to {:e} in raw-unit and mass terms.",
                    spec.id, EPSILON
                ));
            }
            if spec.pieces_per_unit == 0.0 {
                diagnostics.push(format!(
                    "Numeric guard: pieces_per_unit of '{}' is 0; \
                     floored to {:e} in raw-unit and mass terms.",
                    spec.id, EPSILON
                ));
            }
            products.push(Product {
                id: spec.id,
                priority_weight: spec.priority_weight,
                yield_fraction: spec.yield_fraction,
                pieces_per_unit: spec.pieces_per_unit,
                prices: vec![0.0; formats.len()],
            });
        }

        let product_idx = |id: &str| {
            products
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| unknown("product", &id))
        };
        let format_idx = |id: &str| {
            formats
                .iter()
                .position(|f| f.id == id)
                .ok_or_else(|| unknown("box format", &id))
        };
        let line_idx = |id: &str| {
            lines
                .iter()
                .position(|l| l.id == id)
                .ok_or_else(|| unknown("line", &id))
        };
        let area_idx = |id: &str| {
            areas
                .iter()
                .position(|a| a.id == id)
                .ok_or_else(|| unknown("packing area", &id))
        };

        let mut price_table = Vec::with_capacity(self.prices.len());
        for (product, format, price) in &self.prices {
            if !price.is_finite() {
                return Err(PlanningError::Configuration(format!(
                    "price of '{}' in '{}' must be finite",
                    product, format
                )));
            }
            price_table.push((product_idx(product)?, format_idx(format)?, *price));
        }
        let mut line_sizes = CompatibilityMatrix::new(lines.len(), sizes.len());
        for (line, size) in &self.line_sizes {
            if *size >= sizes.len() {
                return Err(unknown("size index", size));
            }
            line_sizes.allow(line_idx(line)?, *size);
        }

        let product_areas = match &self.product_areas {
            None => CompatibilityMatrix::all(products.len(), areas.len()),
            Some(pairs) => {
                let mut matrix = CompatibilityMatrix::new(products.len(), areas.len());
                for (product, area) in pairs {
                    matrix.allow(product_idx(product)?, area_idx(area)?);
                }
                matrix
            }
        };

        let mass_limit = match &self.mass_limit {
            None => None,
            Some((area, ceiling_kg)) => {
                if !ceiling_kg.is_finite() || *ceiling_kg < 0.0 {
                    return Err(PlanningError::Configuration(format!(
                        "mass ceiling must be >= 0 kg (got {})",
                        ceiling_kg
                    )));
                }
                Some(MassLimit {
                    area: area_idx(area)?,
                    ceiling_kg: *ceiling_kg,
                })
            }
        };

        let mut exclusive_lines = vec![None; products.len()];
        for (product, line) in &self.exclusive_lines {
            exclusive_lines[product_idx(product)?] = Some(line_idx(line)?);
        }

        let mut heuristic = HeuristicSettings {
            default_product: self
                .default_product
                .as_deref()
                .map(product_idx)
                .transpose()?,
            rotation: Vec::new(),
            area_priority: (0..products.len())
                .map(|p| product_areas.row(p).collect())
                .collect(),
            preferred_format: vec![None; products.len()],
        };
        for (product, weight) in &self.rotation {
            let p = product_idx(product)?;
            heuristic
                .rotation
                .extend(std::iter::repeat(p).take(*weight as usize));
        }
        for (product, order) in &self.area_priority {
            let p = product_idx(product)?;
            let mut ranked = Vec::with_capacity(order.len());
            for area in order {
                let e = area_idx(area)?;
                if !product_areas.allows(p, e) {
                    return Err(PlanningError::Configuration(format!(
                        "area priority of '{}' lists '{}', which the product may not use",
                        product, area
                    )));
                }
                ranked.push(e);
            }
            // Allowed areas missing from the priority list keep their natural order at the end.
            for e in product_areas.row(p) {
                if !ranked.contains(&e) {
                    ranked.push(e);
                }
            }
            heuristic.area_priority[p] = ranked;
        }
        for (product, format) in &self.preferred_format {
            heuristic.preferred_format[product_idx(product)?] = Some(format_idx(format)?);
        }

        for (p, k, price) in price_table {
            products[p].prices[k] = price;
        }

        Ok(ParameterStore {
            version: 1,
            products,
            lines,
            areas,
            formats,
            sizes,
            line_sizes,
            product_areas,
            mass_limit,
            exclusive_lines,
            heuristic,
            settings: self.settings,
            diagnostics,
        })
    }
}

fn require_non_empty(what: &str, len: usize) -> Result<()> {
    if len == 0 {
        return Err(PlanningError::Configuration(format!(
            "'{}' must not be empty",
            what
        )));
    }
    Ok(())
}

fn require_unique<'a, I>(what: &str, ids: I) -> Result<()>
where
    I: Iterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PlanningError::Configuration(format!(
                "duplicate id '{}' in '{}'",
                id, what
            )));
        }
    }
    Ok(())
}

fn unknown(kind: &str, id: &dyn std::fmt::Display) -> PlanningError {
    PlanningError::Configuration(format!("unknown {} '{}'", kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ParameterStoreBuilder {
        ParameterStore::builder()
            .product("FIL", 1.0, 0.5, 2.0)
            .line("L1", 1000.0)
            .area("Fresco", 2000.0)
            .area("Congelado", 500.0)
            .format("10lb")
            .pieces_per_box("10lb", 6, 5)
            .line_accepts("L1", 6)
            .price("FIL", "10lb", 12.0)
    }

    #[test]
    fn defaults_to_fourteen_size_classes_and_all_areas() {
        let store = base().build().unwrap();
        assert_eq!(store.sizes().len(), 14);
        assert_eq!(store.size_index("7-8"), Some(6));
        assert_eq!(store.size_index("14+"), Some(13));
        assert!(store.area_accepts(0, 0));
        assert!(store.area_accepts(0, 1));
        assert_eq!(store.pieces_per_box(0, 6), 5);
        assert_eq!(store.pieces_per_box(0, 5), 0);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn explicit_area_list_closes_other_areas() {
        let store = base().product_area("FIL", "Fresco").build().unwrap();
        assert!(store.area_accepts(0, 0));
        assert!(!store.area_accepts(0, 1));
        assert_eq!(store.heuristic().area_priority[0], vec![0]);
    }

    #[test]
    fn unknown_references_are_configuration_errors() {
        let err = base().line_accepts("L9", 3).build().unwrap_err();
        assert!(matches!(err, PlanningError::Configuration(_)));
        assert!(err.to_string().contains("unknown line 'L9'"));

        let err = base().pieces_per_box("10lb", 20, 4).build().unwrap_err();
        assert!(err.to_string().contains("size index"));
    }

    #[test]
    fn empty_sets_are_rejected() {
        let err = ParameterStore::builder().build().unwrap_err();
        assert!(err.to_string().contains("'products' must not be empty"));
    }

    #[test]
    fn zero_yield_is_accepted_with_a_guard_note() {
        let store = base().product("ZERO", 1.0, 0.0, 2.0).build().unwrap();
        assert_eq!(store.diagnostics().len(), 1);
        assert!(store.diagnostics()[0].contains("yield of 'ZERO'"));
        assert!(store.products()[1].units_per_piece() > 1e8);
    }

    #[test]
    fn yield_above_one_is_rejected() {
        assert!(base().product("BAD", 1.0, 1.5, 2.0).build().is_err());
    }

    #[test]
    fn negative_capacity_is_rejected() {
        assert!(base().line("L2", -1.0).build().is_err());
    }

    #[test]
    fn edits_produce_new_versions() {
        let store = base().build().unwrap();
        let edited = store.with_line_capacity("L1", 50.0).unwrap();
        assert_eq!(store.lines()[0].capacity, 1000.0);
        assert_eq!(edited.lines()[0].capacity, 50.0);
        assert_eq!(edited.version(), 2);
        assert!(store.with_area_capacity("Nope", 1.0).is_err());
        assert!(store.with_line_capacity("L1", f64::NAN).is_err());
    }

    #[test]
    fn exclusive_line_restricts_product() {
        let store = base()
            .line("L2", 500.0)
            .exclusive_line("FIL", "L2")
            .build()
            .unwrap();
        assert!(!store.product_allowed_on(0, 0));
        assert!(store.product_allowed_on(0, 1));
    }

    #[test]
    fn rotation_is_expanded_by_weight() {
        let store = base()
            .product("HON", 1.0, 0.8, 1.0)
            .rotation_step("FIL", 2)
            .rotation_step("HON", 1)
            .build()
            .unwrap();
        assert_eq!(store.heuristic().rotation, vec![0, 0, 1]);
    }

    #[test]
    fn mass_limit_must_name_a_known_area() {
        assert!(base().mass_limit("Nowhere", 10.0).build().is_err());
        let store = base().mass_limit("Congelado", 22_500.0).build().unwrap();
        assert_eq!(store.mass_limit().map(|m| m.area), Some(1));
    }

    #[test]
    fn kg_per_piece_uses_pound_conversion() {
        let store = base().build().unwrap();
        let product = &store.products()[0];
        let kg = product.kg_per_piece(2.20462 * 4.0);
        assert!((kg - 1.0).abs() < 1e-12);
    }
}
