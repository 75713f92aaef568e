// Objective and constraint families over the admissible tuples.
//
// | Family | Index | Row |
// |--------|-------|-----|
// | availability | size c | Σ ppb·x / max(ε, ppu·yield) ≤ raw units of c |
// | line capacity | line j | Σ ppb·x ≤ capacity of j |
// | area capacity | area e | Σ ppb·x ≤ capacity of e |
// | item demand | (p, k, c) | Σ x ≤ boxes demanded |
// | size demand | size c | Σ ppb·x ≤ pieces demanded |
// | mass ceiling | mass-limited area | Σ ppb·x · kg/piece ≤ ceiling |
//
// A row whose index has no admissible tuple is omitted.

use super::variable_space::VariableSpace;
use crate::domain::{
    Assignment, Constraint, ConstraintType, ObjectiveFunction, OptimizationProblem,
    OptimizationType, ParameterStore, PlanningRequest, SolverConfig, Variable,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

type Terms = Vec<(usize, f64)>;

/// The planning MIP together with the tuple behind each column.
#[derive(Debug, Clone)]
pub struct ConstraintModel {
    assignments: Vec<Assignment>,
    problem: OptimizationProblem,
    notes: Vec<String>,
}

impl ConstraintModel {
    #[instrument(skip_all, fields(parameters_version = request.params().version()))]
    pub fn build(request: &PlanningRequest, config: SolverConfig) -> Self {
        let params = request.params();
        let availability = request.availability();
        let demand = request.demand();
        let space = VariableSpace::new(params);
        let assignments: Vec<Assignment> = space.iter().collect();
        let n = assignments.len();

        let mut objective = Vec::with_capacity(n);
        let mut variables = Vec::with_capacity(n);
        let mut by_size: Vec<Terms> = vec![Vec::new(); params.sizes().len()];
        let mut pieces_by_size: Vec<Terms> = vec![Vec::new(); params.sizes().len()];
        let mut by_line: Vec<Terms> = vec![Vec::new(); params.lines().len()];
        let mut by_area: Vec<Terms> = vec![Vec::new(); params.areas().len()];
        let mut by_item: BTreeMap<(usize, usize, usize), Terms> = BTreeMap::new();
        let mut mass_terms: Terms = Vec::new();
        let mass_limit = params.mass_limit();

        for (i, a) in assignments.iter().enumerate() {
            let product = &params.products()[a.product];
            let per_box = f64::from(params.pieces_per_box(a.format, a.size));

            objective.push(product.box_value(a.format));
            variables.push(Variable::integer(variable_name(params, a)));

            by_size[a.size].push((i, per_box * product.units_per_piece()));
            pieces_by_size[a.size].push((i, per_box));
            by_line[a.line].push((i, per_box));
            by_area[a.area].push((i, per_box));
            by_item
                .entry((a.product, a.format, a.size))
                .or_default()
                .push((i, 1.0));

            if mass_limit.is_some_and(|m| m.area == a.area) {
                let unit_weight = params.sizes()[a.size].avg_unit_weight_lb;
                mass_terms.push((i, per_box * product.kg_per_piece(unit_weight)));
            }
        }

        let mut notes = Vec::new();
        let mut constraints = Vec::new();

        for (c, terms) in by_size.into_iter().enumerate() {
            let label = &params.sizes()[c].label;
            if terms.is_empty() {
                let units = availability.units(c);
                if units > 0 {
                    notes.push(format!(
                        "Size class {}: no valid assignments ({} raw units left unplanned).",
                        label, units
                    ));
                }
                continue;
            }
            constraints.push(
                Constraint::new(
                    ConstraintType::LessThanOrEqual,
                    terms,
                    availability.units(c) as f64,
                )
                .with_name(format!("availability_{}", sanitize(label))),
            );
        }
        debug!(rows = constraints.len(), "availability rows");

        for (j, terms) in by_line.into_iter().enumerate() {
            if terms.is_empty() {
                continue;
            }
            let line = &params.lines()[j];
            constraints.push(
                Constraint::new(ConstraintType::LessThanOrEqual, terms, line.capacity)
                    .with_name(format!("line_capacity_{}", sanitize(&line.id))),
            );
        }

        for (e, terms) in by_area.into_iter().enumerate() {
            if terms.is_empty() {
                continue;
            }
            let area = &params.areas()[e];
            constraints.push(
                Constraint::new(ConstraintType::LessThanOrEqual, terms, area.capacity)
                    .with_name(format!("area_capacity_{}", sanitize(&area.id))),
            );
        }

        if let Some(demand) = demand.filter(|d| d.has_item_limits()) {
            let before = constraints.len();
            for ((p, k, c), terms) in by_item {
                let limit = demand.item_limit(p, k, c).map_or(0.0, |d| d.boxes);
                constraints.push(
                    Constraint::new(ConstraintType::LessThanOrEqual, terms, limit).with_name(
                        format!(
                            "demand_{}_{}_{}",
                            sanitize(&params.products()[p].id),
                            sanitize(&params.formats()[k].id),
                            sanitize(&params.sizes()[c].label)
                        ),
                    ),
                );
            }
            debug!(rows = constraints.len() - before, "item demand rows");
        }

        if let Some(demand) = demand.filter(|d| d.has_size_limits()) {
            for (c, terms) in pieces_by_size.into_iter().enumerate() {
                if terms.is_empty() {
                    continue;
                }
                let limit = demand.size_limit(c).unwrap_or(0.0);
                constraints.push(
                    Constraint::new(ConstraintType::LessThanOrEqual, terms, limit).with_name(
                        format!("size_demand_{}", sanitize(&params.sizes()[c].label)),
                    ),
                );
            }
        }

        if let Some(limit) = mass_limit {
            if !mass_terms.is_empty() {
                let area = &params.areas()[limit.area].id;
                constraints.push(
                    Constraint::new(ConstraintType::LessThanOrEqual, mass_terms, limit.ceiling_kg)
                        .with_name(format!("mass_ceiling_{}", sanitize(area))),
                );
                notes.push(format!(
                    "Mass ceiling applied: {} limited to {} kg/shift \
                     ((pieces/box × boxes / pieces per unit) × unit weight × yield / 2.20462).",
                    area, limit.ceiling_kg
                ));
            }
        }

        info!(
            variables = n,
            cartesian = space.cartesian_len(),
            constraints = constraints.len(),
            "planning model built"
        );

        let mut problem = OptimizationProblem::new(ObjectiveFunction::new(
            OptimizationType::Maximize,
            objective,
        ))
        .with_name(format!("production_plan_v{}", params.version()))
        .with_variables(variables)
        .with_config(config);
        problem.constraints = constraints;

        Self {
            assignments,
            problem,
            notes,
        }
    }

    /// Tuple behind each column, in column order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn problem(&self) -> &OptimizationProblem {
        &self.problem
    }

    /// Notes raised while formulating (uncovered sizes, mass ceiling).
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.problem.constraints.iter().find(|c| c.name == name)
    }
}

fn variable_name(params: &ParameterStore, a: &Assignment) -> String {
    format!(
        "x_{}_{}_{}_{}_{}",
        sanitize(&params.products()[a.product].id),
        sanitize(&params.lines()[a.line].id),
        sanitize(&params.areas()[a.area].id),
        sanitize(&params.formats()[a.format].id),
        a.size
    )
}

/// LP-file-safe identifier.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, DemandRow, DemandTable, SizeRef};
    use std::sync::Arc;

    fn params() -> ParameterStore {
        ParameterStore::builder()
            .product("FIL", 2.0, 0.5, 2.0)
            .line("L1", 1000.0)
            .line("L2", 800.0)
            .area("Fresco", 2000.0)
            .area("Congelado", 900.0)
            .format("10lb")
            .pieces_per_box("10lb", 6, 5)
            .unit_weight(6, 8.0)
            .line_accepts("L1", 6)
            .line_accepts("L2", 6)
            .price("FIL", "10lb", 10.0)
            .mass_limit("Congelado", 22_500.0)
            .build()
            .unwrap()
    }

    fn request(params: ParameterStore, units: u64) -> PlanningRequest {
        let availability = Availability::zeros(14).with_units(6, units).with_units(13, 7);
        PlanningRequest::new(Arc::new(params), availability).unwrap()
    }

    #[test]
    fn objective_is_weight_times_price() {
        let model = ConstraintModel::build(&request(params(), 500), SolverConfig::default());
        assert_eq!(model.assignments().len(), 4);
        assert!(model
            .problem()
            .objective
            .coefficients
            .iter()
            .all(|&c| c == 20.0));
        assert_eq!(model.problem().num_integer_variables(), 4);
    }

    #[test]
    fn availability_row_uses_raw_unit_coefficients() {
        let model = ConstraintModel::build(&request(params(), 500), SolverConfig::default());
        let row = model.constraint("availability_7_8").unwrap();
        assert_eq!(row.bound, 500.0);
        // 5 pieces per box / (2 pieces per unit × 0.5 yield) = 5 raw units per box
        assert!(row.terms.iter().all(|&(_, c)| (c - 5.0).abs() < 1e-12));
        assert_eq!(row.terms.len(), 4);
    }

    #[test]
    fn capacity_rows_cover_every_line_and_area() {
        let model = ConstraintModel::build(&request(params(), 500), SolverConfig::default());
        assert_eq!(model.constraint("line_capacity_L1").unwrap().bound, 1000.0);
        assert_eq!(model.constraint("line_capacity_L2").unwrap().terms.len(), 2);
        assert_eq!(model.constraint("area_capacity_Congelado").unwrap().bound, 900.0);
    }

    #[test]
    fn mass_row_only_touches_the_limited_area() {
        let model = ConstraintModel::build(&request(params(), 500), SolverConfig::default());
        let row = model.constraint("mass_ceiling_Congelado").unwrap();
        assert_eq!(row.terms.len(), 2);
        let expected = 5.0 / 2.0 * 8.0 * 0.5 / 2.20462;
        assert!(row.terms.iter().all(|&(_, c)| (c - expected).abs() < 1e-12));
        for &(i, _) in &row.terms {
            assert_eq!(model.assignments()[i].area, 1);
        }
        assert!(model.notes().iter().any(|n| n.starts_with("Mass ceiling applied")));
    }

    #[test]
    fn uncovered_size_with_stock_is_noted_not_constrained() {
        let model = ConstraintModel::build(&request(params(), 500), SolverConfig::default());
        assert!(model.constraint("availability_14_").is_none());
        assert!(model
            .notes()
            .iter()
            .any(|n| n.contains("Size class 14+: no valid assignments (7 raw units")));
    }

    #[test]
    fn item_demand_rows_only_when_demand_is_supplied() {
        let params = params();
        let plain = ConstraintModel::build(&request(params.clone(), 500), SolverConfig::default());
        assert!(plain
            .problem()
            .constraints
            .iter()
            .all(|c| !c.name.starts_with("demand_")));

        let demand = DemandTable::from_rows(
            &params,
            vec![DemandRow::Detailed {
                product: "FIL".into(),
                format: "10lb".into(),
                size: SizeRef::Index(6),
                boxes: 50.0,
            }],
        )
        .unwrap();
        let with_demand = ConstraintModel::build(
            &request(params, 500).with_demand(demand),
            SolverConfig::default(),
        );
        let row = with_demand.constraint("demand_FIL_10lb_7_8").unwrap();
        assert_eq!(row.bound, 50.0);
        assert_eq!(row.terms.len(), 4);
    }

    #[test]
    fn size_demand_row_bounds_pieces_with_per_box_coefficients() {
        let params = params();
        let demand = DemandTable::from_rows(
            &params,
            vec![DemandRow::Simple {
                size: "7-8".into(),
                pieces: 600.0,
            }],
        )
        .unwrap();
        let model = ConstraintModel::build(
            &request(params, 500).with_demand(demand),
            SolverConfig::default(),
        );

        let row = model.constraint("size_demand_7_8").unwrap();
        assert_eq!(row.constraint_type, ConstraintType::LessThanOrEqual);
        assert_eq!(row.bound, 600.0);
        assert_eq!(row.terms.len(), 4);
        assert!(row.terms.iter().all(|&(_, c)| c == 5.0));
        // only sizes with columns get a row
        assert!(model.constraint("size_demand_14_").is_none());
        assert!(model
            .problem()
            .constraints
            .iter()
            .all(|c| !c.name.starts_with("demand_")));
    }

    #[test]
    fn empty_space_builds_an_empty_model() {
        let params = ParameterStore::builder()
            .product("P", 1.0, 1.0, 1.0)
            .line("L", 10.0)
            .area("A", 10.0)
            .format("K")
            .build()
            .unwrap();
        let model = ConstraintModel::build(&request(params, 3), SolverConfig::default());
        assert!(model.is_empty());
        assert!(model.problem().constraints.is_empty());
        assert_eq!(model.notes().len(), 2);
    }
}
