// Turns allocator output into the common plan shape and computes KPIs.

use crate::domain::{
    AllocationOutcome, AllocationStrategy, Assignment, ParameterStore, PlanKpis, PlanReport,
    PlanRow, PlanTable, PlanningRequest,
};

/// Builds a plan row for `boxes` boxes of assignment `a`.
pub fn plan_row(params: &ParameterStore, a: Assignment, boxes: u64) -> PlanRow {
    let per_box = u64::from(params.pieces_per_box(a.format, a.size));
    PlanRow {
        assignment: a,
        line: params.lines()[a.line].id.clone(),
        packing_area: params.areas()[a.area].id.clone(),
        product: params.products()[a.product].id.clone(),
        box_format: params.formats()[a.format].id.clone(),
        size_label: params.sizes()[a.size].label.clone(),
        box_count: boxes,
        piece_count: per_box * boxes,
    }
}

/// Pieces per line, in line order.
pub fn pieces_per_line(params: &ParameterStore, rows: &[PlanRow]) -> Vec<u64> {
    let mut used = vec![0u64; params.lines().len()];
    for row in rows {
        used[row.assignment.line] += row.piece_count;
    }
    used
}

/// `100 × used / capacity`, or 0 for a line without capacity.
pub fn usage_percent(used: f64, capacity: f64) -> f64 {
    if capacity > 0.0 {
        100.0 * used / capacity
    } else {
        0.0
    }
}

pub fn compute_kpis(params: &ParameterStore, rows: &[PlanRow]) -> PlanKpis {
    let mass_limit = params.mass_limit();
    let mut raw_units_consumed = 0.0;
    let mut mass_kg = 0.0;

    for row in rows {
        let a = row.assignment;
        let product = &params.products()[a.product];
        let pieces = row.piece_count as f64;
        raw_units_consumed += pieces * product.units_per_piece();
        if mass_limit.is_some_and(|m| m.area == a.area) {
            mass_kg += pieces * product.kg_per_piece(params.sizes()[a.size].avg_unit_weight_lb);
        }
    }

    let line_usage = params
        .lines()
        .iter()
        .zip(pieces_per_line(params, rows))
        .map(|(line, used)| (line.id.clone(), usage_percent(used as f64, line.capacity)))
        .collect();

    PlanKpis {
        total_boxes: rows.iter().map(|r| r.box_count).sum(),
        total_pieces: rows.iter().map(|r| r.piece_count).sum(),
        raw_units_consumed,
        mass_limited_kg: mass_limit.map(|_| mass_kg),
        line_usage,
    }
}

/// Wraps an outcome into a report. Notes are passed through untouched.
pub fn into_report(
    request: &PlanningRequest,
    strategy: AllocationStrategy,
    outcome: AllocationOutcome,
) -> PlanReport {
    let params = request.params();
    let kpis = compute_kpis(params, &outcome.rows);
    PlanReport {
        parameters_version: params.version(),
        strategy,
        status: outcome.status,
        objective_value: outcome.objective_value,
        table: PlanTable::new(outcome.rows),
        kpis,
        notes: outcome.notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, SolutionStatus};
    use std::sync::Arc;

    fn params() -> ParameterStore {
        ParameterStore::builder()
            .product("FIL", 1.0, 0.5, 2.0)
            .line("L1", 1000.0)
            .line("Idle", 0.0)
            .area("Fresco", 2000.0)
            .area("Congelado", 2000.0)
            .format("10lb")
            .pieces_per_box("10lb", 6, 5)
            .unit_weight(6, 2.20462)
            .line_accepts("L1", 6)
            .mass_limit("Congelado", 100.0)
            .build()
            .unwrap()
    }

    fn at(area: usize) -> Assignment {
        Assignment {
            product: 0,
            line: 0,
            area,
            format: 0,
            size: 6,
        }
    }

    #[test]
    fn plan_row_derives_pieces_and_labels() {
        let params = params();
        let row = plan_row(&params, at(1), 40);
        assert_eq!(row.piece_count, 200);
        assert_eq!(row.size_label, "7-8");
        assert_eq!(row.packing_area, "Congelado");
    }

    #[test]
    fn kpis_cover_units_mass_and_usage() {
        let params = params();
        let rows = vec![plan_row(&params, at(0), 40), plan_row(&params, at(1), 20)];
        let kpis = compute_kpis(&params, &rows);

        assert_eq!(kpis.total_boxes, 60);
        assert_eq!(kpis.total_pieces, 300);
        // 300 pieces / (2 × 0.5)
        assert!((kpis.raw_units_consumed - 300.0).abs() < 1e-9);
        // 100 pieces × 1 lb × 0.5 / 2 / 2.20462 lb/kg
        let expected_mass = 100.0 * 2.20462 * 0.5 / 2.0 / 2.20462;
        assert!((kpis.mass_limited_kg.unwrap() - expected_mass).abs() < 1e-9);
        assert_eq!(kpis.line_usage["L1"], 30.0);
        assert_eq!(kpis.line_usage["Idle"], 0.0);
    }

    #[test]
    fn report_keeps_notes_in_order() {
        let params = Arc::new(params());
        let request = PlanningRequest::new(params.clone(), Availability::zeros(14)).unwrap();
        let outcome = AllocationOutcome {
            status: SolutionStatus::Optimal,
            rows: vec![plan_row(&params, at(0), 1)],
            objective_value: Some(1.0),
            notes: vec!["first".into(), "second".into()],
        };
        let report = into_report(&request, AllocationStrategy::Exact, outcome);
        assert_eq!(report.notes, vec!["first".to_string(), "second".to_string()]);
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.parameters_version, 1);
        assert!(report.has_plan());
    }
}
