// Plan rows, the immutable plan table and the KPIs reported alongside it.

use super::value_objects::{AllocationStrategy, SolutionStatus};
use indexmap::IndexMap;
use std::fmt;

/// Index tuple of one decision variable `x[product, line, area, format, size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Assignment {
    pub product: usize,
    pub line: usize,
    pub area: usize,
    pub format: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub assignment: Assignment,
    pub line: String,
    pub packing_area: String,
    pub product: String,
    pub box_format: String,
    pub size_label: String,
    pub box_count: u64,
    pub piece_count: u64,
}

/// Rows of one allocation run. There is no way to change a table once built;
/// a new run produces a new table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanTable {
    rows: Vec<PlanRow>,
}

impl PlanTable {
    pub const COLUMNS: [&'static str; 7] = [
        "line",
        "packing_area",
        "product",
        "box_format",
        "size_label",
        "box_count",
        "piece_count",
    ];

    pub fn new(rows: Vec<PlanRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_boxes(&self) -> u64 {
        self.rows.iter().map(|r| r.box_count).sum()
    }

    pub fn total_pieces(&self) -> u64 {
        self.rows.iter().map(|r| r.piece_count).sum()
    }
}

impl<'a> IntoIterator for &'a PlanTable {
    type Item = &'a PlanRow;
    type IntoIter = std::slice::Iter<'a, PlanRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for PlanTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [line, area, product, format, size, boxes, pieces] = Self::COLUMNS;
        writeln!(
            f,
            "{:<14} {:<12} {:<10} {:<10} {:<10} {:>9} {:>11}",
            line, area, product, format, size, boxes, pieces
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<14} {:<12} {:<10} {:<10} {:<10} {:>9} {:>11}",
                row.line,
                row.packing_area,
                row.product,
                row.box_format,
                row.size_label,
                row.box_count,
                row.piece_count
            )?;
        }
        Ok(())
    }
}

/// Aggregate indicators of a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanKpis {
    pub total_boxes: u64,
    pub total_pieces: u64,
    /// Estimated raw units consumed, Σ pieces / (pieces per unit × yield).
    pub raw_units_consumed: f64,
    /// Kilograms routed through the mass-limited area, when one is configured.
    pub mass_limited_kg: Option<f64>,
    /// Percentage of each line's capacity used, in line order.
    pub line_usage: IndexMap<String, f64>,
}

impl PlanKpis {
    pub fn average_line_usage(&self) -> f64 {
        self.line_usage.values().sum::<f64>() / self.line_usage.len().max(1) as f64
    }
}

impl fmt::Display for PlanKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total pieces planned: {}", self.total_pieces)?;
        writeln!(f, "Total boxes planned: {}", self.total_boxes)?;
        writeln!(f, "Raw units consumed: {:.1}", self.raw_units_consumed)?;
        if let Some(kg) = self.mass_limited_kg {
            writeln!(f, "Mass through limited area: {:.1} kg", kg)?;
        }
        writeln!(f, "Average line usage: {:.1}%", self.average_line_usage())?;
        for (line, usage) in &self.line_usage {
            writeln!(f, "- {}: {:.1}%", line, usage)?;
        }
        Ok(())
    }
}

/// What a caller gets back from one planning run.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub parameters_version: u64,
    pub strategy: AllocationStrategy,
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    pub table: PlanTable,
    pub kpis: PlanKpis,
    pub notes: Vec<String>,
}

impl PlanReport {
    pub fn has_plan(&self) -> bool {
        !self.table.is_empty()
    }
}
