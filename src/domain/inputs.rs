// Per-run inputs: raw material on hand and optional demand ceilings.

use super::allocator::{PlanningError, Result};
use super::parameters::ParameterStore;
use std::collections::HashMap;

/// Raw-unit count per size class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    units: Vec<u64>,
}

impl Availability {
    pub fn zeros(num_sizes: usize) -> Self {
        Self {
            units: vec![0; num_sizes],
        }
    }

    /// Builds availability from `(size label, raw units)` rows. Duplicate
    /// labels are summed; negative counts and unknown labels are rejected.
    pub fn from_rows<I, S>(params: &ParameterStore, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut availability = Self::zeros(params.sizes().len());
        for (label, count) in rows {
            let label = label.as_ref().trim();
            let size = params.size_index(label).ok_or_else(|| {
                PlanningError::InputValidation(format!("Unknown size label '{}'", label))
            })?;
            if count < 0 {
                return Err(PlanningError::InputValidation(format!(
                    "Negative raw-unit count {} for size '{}'",
                    count, label
                )));
            }
            let slot = &mut availability.units[size];
            *slot = slot.checked_add(count as u64).ok_or_else(|| {
                PlanningError::InputValidation(format!(
                    "Raw-unit count overflow for size '{}'",
                    label
                ))
            })?;
        }
        Ok(availability)
    }

    /// Builds availability from a vector indexed by size class.
    pub fn from_units(params: &ParameterStore, units: Vec<u64>) -> Result<Self> {
        if units.len() != params.sizes().len() {
            return Err(PlanningError::InputValidation(format!(
                "Availability has {} size classes but the configuration defines {}",
                units.len(),
                params.sizes().len()
            )));
        }
        Ok(Self { units })
    }

    pub fn with_units(mut self, size: usize, units: u64) -> Self {
        if let Some(slot) = self.units.get_mut(size) {
            *slot = units;
        }
        self
    }

    pub fn units(&self, size: usize) -> u64 {
        self.units.get(size).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.units.iter().fold(0u64, |acc, &u| acc.saturating_add(u))
    }
}

/// Size reference in a detailed demand row.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeRef {
    Index(usize),
    Label(String),
}

impl SizeRef {
    /// Numeric strings are indices, anything else is a label.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(index) => SizeRef::Index(index),
            Err(_) => SizeRef::Label(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DemandRow {
    /// Pieces wanted for a size class, any product or format.
    Simple { size: String, pieces: f64 },
    /// Boxes wanted for one (product, format, size) item.
    Detailed {
        product: String,
        format: String,
        size: SizeRef,
        boxes: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDemand {
    pub boxes: f64,
    pub pieces: f64,
}

/// Optional demand ceilings.
///
/// A table that carries detailed rows bounds every (product, format, size)
/// item it does not list to zero; the same holds for simple rows and size
/// classes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandTable {
    items: Option<HashMap<(usize, usize, usize), ItemDemand>>,
    sizes: Option<Vec<f64>>,
}

impl DemandTable {
    pub fn from_rows<I>(params: &ParameterStore, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = DemandRow>,
    {
        let mut table = Self::default();
        for row in rows {
            match row {
                DemandRow::Simple { size, pieces } => {
                    check_amount(pieces, &size)?;
                    let c = params.size_index(size.trim()).ok_or_else(|| {
                        PlanningError::InputValidation(format!("Unknown size label '{}'", size))
                    })?;
                    let sizes = table
                        .sizes
                        .get_or_insert_with(|| vec![0.0; params.sizes().len()]);
                    sizes[c] += pieces;
                }
                DemandRow::Detailed {
                    product,
                    format,
                    size,
                    boxes,
                } => {
                    let what = format!("{}/{}", product, format);
                    check_amount(boxes, &what)?;
                    let p = params.product_index(&product).ok_or_else(|| {
                        PlanningError::InputValidation(format!("Unknown product '{}'", product))
                    })?;
                    let k = params.format_index(&format).ok_or_else(|| {
                        PlanningError::InputValidation(format!("Unknown box format '{}'", format))
                    })?;
                    let c = match &size {
                        SizeRef::Index(i) if *i < params.sizes().len() => *i,
                        SizeRef::Index(i) => {
                            return Err(PlanningError::InputValidation(format!(
                                "Unknown size index {}",
                                i
                            )))
                        }
                        SizeRef::Label(label) => params.size_index(label).ok_or_else(|| {
                            PlanningError::InputValidation(format!(
                                "Unknown size label '{}'",
                                label
                            ))
                        })?,
                    };
                    let per_box = params.pieces_per_box(k, c);
                    if per_box == 0 {
                        return Err(PlanningError::InputValidation(format!(
                            "Format '{}' is not offered for size '{}'",
                            format,
                            params.sizes()[c].label
                        )));
                    }
                    let entry = table
                        .items
                        .get_or_insert_with(HashMap::new)
                        .entry((p, k, c))
                        .or_insert(ItemDemand {
                            boxes: 0.0,
                            pieces: 0.0,
                        });
                    entry.boxes += boxes;
                    entry.pieces += boxes * f64::from(per_box);
                }
            }
        }
        Ok(table)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_none() && self.sizes.is_none()
    }

    pub fn has_item_limits(&self) -> bool {
        self.items.is_some()
    }

    pub fn has_size_limits(&self) -> bool {
        self.sizes.is_some()
    }

    /// Box ceiling of an item, if detailed demand was supplied.
    pub fn item_limit(&self, product: usize, format: usize, size: usize) -> Option<ItemDemand> {
        self.items.as_ref().map(|items| {
            items
                .get(&(product, format, size))
                .copied()
                .unwrap_or(ItemDemand {
                    boxes: 0.0,
                    pieces: 0.0,
                })
        })
    }

    /// Piece ceiling of a size class, if simple demand was supplied.
    pub fn size_limit(&self, size: usize) -> Option<f64> {
        self.sizes
            .as_ref()
            .map(|sizes| sizes.get(size).copied().unwrap_or(0.0))
    }
}

fn check_amount(value: f64, what: &str) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PlanningError::InputValidation(format!(
            "Demand for '{}' must be a finite number >= 0 (got {})",
            what, value
        )));
    }
    Ok(())
}
