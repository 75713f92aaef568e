use salmon_planner::domain::{
    Availability, OptimizationProblem, ParameterStore, PlannerSettings, PlanningRequest, Solution,
    SolutionStatus, SolverConfig, SolverError, SolverService,
};
use salmon_planner::infrastructure::DiagnosticSink;
use salmon_planner::planning::{extractor, VariableSpace};
use salmon_planner::{
    AllocationStrategy, Allocator, ExactAllocator, GreedyAllocator, PlanningService,
};
use std::sync::Arc;

const SIZE_7_8: usize = 6;

/// Two lines (1000 and 800 pieces), one area (2000), one product at
/// 2 pieces per raw unit, one 5-piece format for size 7-8 priced at 10.
fn scenario_a() -> ParameterStore {
    ParameterStore::builder()
        .product("FIL", 1.0, 1.0, 2.0)
        .line("L1", 1000.0)
        .line("L2", 800.0)
        .area("Fresco", 2000.0)
        .format("K5")
        .pieces_per_box("K5", SIZE_7_8, 5)
        .line_accepts("L1", SIZE_7_8)
        .line_accepts("L2", SIZE_7_8)
        .price("FIL", "K5", 10.0)
        .build()
        .unwrap()
}

fn request(params: ParameterStore, availability: Availability) -> PlanningRequest {
    PlanningRequest::new(Arc::new(params), availability).unwrap()
}

fn stock(units: u64) -> Availability {
    Availability::zeros(14).with_units(SIZE_7_8, units)
}

fn service(strategy: AllocationStrategy) -> PlanningService {
    salmon_planner::infrastructure::logging::init_test();
    let settings = PlannerSettings {
        strategy,
        ..PlannerSettings::default()
    };
    PlanningService::from_settings(&settings).unwrap()
}

#[cfg(feature = "highs")]
mod exact {
    use super::*;
    use salmon_planner::domain::{DemandRow, DemandTable, SizeRef};

    #[test]
    fn scenario_a_fills_available_pieces() {
        let report = service(AllocationStrategy::Exact).run(&request(scenario_a(), stock(500)));

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert_eq!(report.kpis.total_boxes, 200);
        assert_eq!(report.kpis.total_pieces, 1000);
        assert!((report.objective_value.unwrap() - 2000.0).abs() < 1e-6);
        assert!(report
            .notes
            .iter()
            .any(|n| n.starts_with("Optimization finished. Objective value = 2000")));
    }

    #[test]
    fn scenario_b_demand_caps_boxes() {
        let params = scenario_a();
        let demand = DemandTable::from_rows(
            &params,
            vec![DemandRow::Detailed {
                product: "FIL".into(),
                format: "K5".into(),
                size: SizeRef::Label("7-8".into()),
                boxes: 50.0,
            }],
        )
        .unwrap();
        let report = service(AllocationStrategy::Exact)
            .run(&request(params, stock(500)).with_demand(demand));

        assert_eq!(report.kpis.total_boxes, 50);
        assert!((report.objective_value.unwrap() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn scenario_c_size_without_line_is_a_note() {
        let availability = stock(500).with_units(2, 300);
        let report = service(AllocationStrategy::Exact).run(&request(scenario_a(), availability));

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert_eq!(report.kpis.total_boxes, 200);
        assert!(report
            .notes
            .iter()
            .any(|n| n == "Size class 3-4: no valid assignments (300 raw units left unplanned)."));
    }

    #[test]
    fn area_capacity_binds_below_lines_and_stock() {
        // 502 pieces of area against 1800 of lines and 1000 of stock.
        let params = ParameterStore::builder()
            .product("FIL", 1.0, 1.0, 2.0)
            .line("L1", 1000.0)
            .line("L2", 800.0)
            .area("Fresco", 502.0)
            .format("K5")
            .pieces_per_box("K5", SIZE_7_8, 5)
            .line_accepts("L1", SIZE_7_8)
            .line_accepts("L2", SIZE_7_8)
            .price("FIL", "K5", 10.0)
            .build()
            .unwrap();
        let report = service(AllocationStrategy::Exact).run(&request(params, stock(500)));

        assert_eq!(report.status, SolutionStatus::Optimal);
        assert_eq!(report.kpis.total_boxes, 100);
        assert_eq!(report.kpis.total_pieces, 500);
        assert!((report.objective_value.unwrap() - 1000.0).abs() < 1e-6);
        assert!(report.table.iter().all(|r| r.packing_area == "Fresco"));
    }

    #[test]
    fn zero_availability_gives_empty_plan() {
        let report = service(AllocationStrategy::Exact).run(&request(scenario_a(), stock(0)));

        assert!(!report.has_plan());
        assert_eq!(report.kpis.total_pieces, 0);
        assert!(report.notes.iter().any(|n| n.contains("all variables are zero")));
    }

    #[test]
    fn mass_ceiling_limits_the_frozen_area() {
        // 2.20462 lb units at 2 pieces each: 0.5 kg per piece, 2.5 kg per box.
        let params = ParameterStore::builder()
            .product("FIL", 1.0, 1.0, 2.0)
            .line("L1", 1000.0)
            .area("Congelado", 2000.0)
            .format("K5")
            .pieces_per_box("K5", SIZE_7_8, 5)
            .unit_weight(SIZE_7_8, 2.20462)
            .line_accepts("L1", SIZE_7_8)
            .price("FIL", "K5", 10.0)
            .mass_limit("Congelado", 100.0)
            .build()
            .unwrap();
        let report = service(AllocationStrategy::Exact).run(&request(params, stock(500)));

        assert_eq!(report.kpis.total_boxes, 40);
        let kg = report.kpis.mass_limited_kg.unwrap();
        assert!(kg <= 100.0 + 1e-6);
        assert!(report.notes.iter().any(|n| n.starts_with("Mass ceiling applied")));
    }

    #[test]
    fn exclusive_product_stays_on_its_line() {
        let params = ParameterStore::builder()
            .product("FIL", 1.0, 1.0, 1.0)
            .product("HON", 5.0, 1.0, 1.0)
            .line("L1", 100.0)
            .line("L2", 100.0)
            .area("Fresco", 1000.0)
            .format("K5")
            .pieces_per_box("K5", SIZE_7_8, 5)
            .line_accepts("L1", SIZE_7_8)
            .line_accepts("L2", SIZE_7_8)
            .price("FIL", "K5", 10.0)
            .price("HON", "K5", 10.0)
            .exclusive_line("HON", "L2")
            .build()
            .unwrap();
        let report = service(AllocationStrategy::Exact).run(&request(params, stock(1000)));

        for row in report.table.iter() {
            if row.product == "HON" {
                assert_eq!(row.line, "L2");
            }
        }
        assert_eq!(report.kpis.total_pieces, 200);
        assert!(report.table.iter().any(|r| r.product == "HON"));
    }
}

#[test]
fn scenario_d_greedy_respects_capacities() {
    let params = scenario_a();
    let report = service(AllocationStrategy::Greedy).run(&request(params.clone(), stock(500)));

    assert_eq!(report.status, SolutionStatus::Feasible);
    let used = extractor::pieces_per_line(&params, report.table.rows());
    for ((line, pieces), (id, usage)) in params
        .lines()
        .iter()
        .zip(&used)
        .zip(&report.kpis.line_usage)
    {
        assert_eq!(&line.id, id);
        assert!(*pieces as f64 <= line.capacity);
        assert!((usage - 100.0 * *pieces as f64 / line.capacity).abs() < 1e-9);
    }
    assert_eq!(used.iter().sum::<u64>(), report.kpis.total_pieces);
    assert!(report.kpis.total_pieces as f64 <= params.areas()[0].capacity);
    assert!(report.kpis.raw_units_consumed <= 500.0);
}

#[test]
fn greedy_notes_size_without_line() {
    let availability = stock(500).with_units(2, 300);
    let report = service(AllocationStrategy::Greedy).run(&request(scenario_a(), availability));
    assert!(report.has_plan());
    assert!(report
        .notes
        .iter()
        .any(|n| n.starts_with("Size class 3-4: no compatible line")));
}

#[test]
fn exclusion_rule_prunes_the_variable_space() {
    let params = ParameterStore::builder()
        .product("FIL", 1.0, 1.0, 1.0)
        .product("HON", 1.0, 1.0, 1.0)
        .line("L1", 100.0)
        .line("L2", 100.0)
        .area("Fresco", 1000.0)
        .format("K5")
        .pieces_per_box("K5", SIZE_7_8, 5)
        .line_accepts("L1", SIZE_7_8)
        .line_accepts("L2", SIZE_7_8)
        .exclusive_line("HON", "L2")
        .build()
        .unwrap();
    let space = VariableSpace::new(&params);
    assert_eq!(space.len(), 3);
    assert!(space.iter().all(|a| !(a.product == 1 && a.line == 0)));
}

struct FailingEngine;

impl SolverService for FailingEngine {
    fn solve(&self, _problem: &OptimizationProblem) -> Result<Solution, SolverError> {
        Err(SolverError::ExecutionFailed("license server unreachable".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn supports_mip(&self) -> bool {
        true
    }
}

#[test]
fn solve_failure_leaves_artifact_and_empty_plan() {
    let dir = tempfile::tempdir().unwrap();
    let allocator = ExactAllocator::new(
        Arc::new(FailingEngine),
        SolverConfig::default(),
        DiagnosticSink::new(dir.path().join("logs")),
    );
    let request = request(scenario_a(), stock(500));
    let service = PlanningService::new(Arc::new(allocator), AllocationStrategy::Exact);

    let report = service.run(&request);

    assert_eq!(report.status, SolutionStatus::Error);
    assert!(!report.has_plan());
    assert!(report
        .notes
        .iter()
        .any(|n| n.contains("license server unreachable")));

    let artifacts: Vec<_> = std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(artifacts.len(), 1);
    let text = std::fs::read_to_string(&artifacts[0]).unwrap();
    assert!(text.contains("Maximize"));
    assert!(text.contains("line_capacity_L1"));
}

#[test]
fn greedy_and_exact_share_the_allocator_contract() {
    let request = request(scenario_a(), stock(500));
    let greedy: &dyn Allocator = &GreedyAllocator::new();
    let outcome = greedy.allocate(&request);
    for row in &outcome.rows {
        assert_eq!(row.piece_count, row.box_count * 5);
        assert_eq!(row.size_label, "7-8");
    }
}
