// Greedy proportional allocator.
//
// Walks size classes in ascending order and splits the pieces each size can
// yield across its compatible lines in proportion to their free capacity.
// Each share goes to one product (fixed default or weighted round-robin) in
// one packing area and one box format, capped by every remaining resource.
// Pieces that do not fill a whole box are dropped and counted.

use crate::domain::{
    AllocationOutcome, Allocator, Assignment, ParameterStore, PlanRow, PlanningRequest,
    SolutionStatus,
};
use crate::planning::extractor;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyAllocator;

impl GreedyAllocator {
    pub fn new() -> Self {
        Self
    }
}

/// Remaining resources while the allocator walks the size classes.
struct Ledger<'a> {
    params: &'a ParameterStore,
    line_used: Vec<f64>,
    area_used: Vec<f64>,
    units_left: Vec<f64>,
    item_boxes: HashMap<(usize, usize, usize), f64>,
    size_pieces: Vec<f64>,
    mass_kg: f64,
    dropped_pieces: u64,
}

impl<'a> Ledger<'a> {
    fn new(request: &'a PlanningRequest) -> Self {
        let params = request.params();
        let availability = request.availability();
        Self {
            params,
            line_used: vec![0.0; params.lines().len()],
            area_used: vec![0.0; params.areas().len()],
            units_left: (0..params.sizes().len())
                .map(|c| availability.units(c) as f64)
                .collect(),
            item_boxes: HashMap::new(),
            size_pieces: vec![0.0; params.sizes().len()],
            mass_kg: 0.0,
            dropped_pieces: 0,
        }
    }

    fn line_free(&self, line: usize) -> f64 {
        (self.params.lines()[line].capacity - self.line_used[line]).max(0.0)
    }

    fn area_free(&self, area: usize) -> f64 {
        (self.params.areas()[area].capacity - self.area_used[area]).max(0.0)
    }

    /// Largest piece count `a` may still take, before box rounding.
    fn piece_cap(&self, a: Assignment, request: &PlanningRequest) -> f64 {
        let params = self.params;
        let product = &params.products()[a.product];
        let per_box = f64::from(params.pieces_per_box(a.format, a.size));

        let mut cap = self
            .line_free(a.line)
            .min(self.area_free(a.area))
            .min(self.units_left[a.size] / product.units_per_piece());

        if let Some(demand) = request.demand() {
            if let Some(item) = demand.item_limit(a.product, a.format, a.size) {
                let used = self
                    .item_boxes
                    .get(&(a.product, a.format, a.size))
                    .copied()
                    .unwrap_or(0.0);
                cap = cap.min((item.boxes - used).max(0.0) * per_box);
            }
            if let Some(limit) = demand.size_limit(a.size) {
                cap = cap.min((limit - self.size_pieces[a.size]).max(0.0));
            }
        }

        if let Some(limit) = params.mass_limit().filter(|m| m.area == a.area) {
            let kg = product.kg_per_piece(params.sizes()[a.size].avg_unit_weight_lb);
            if kg > 0.0 {
                cap = cap.min((limit.ceiling_kg - self.mass_kg).max(0.0) / kg);
            }
        }

        cap.max(0.0)
    }

    /// Books `boxes` of `a` against every resource.
    fn charge(&mut self, a: Assignment, boxes: u64) {
        let params = self.params;
        let product = &params.products()[a.product];
        let pieces = boxes as f64 * f64::from(params.pieces_per_box(a.format, a.size));

        self.line_used[a.line] += pieces;
        self.area_used[a.area] += pieces;
        let units = pieces * product.units_per_piece();
        self.units_left[a.size] = (self.units_left[a.size] - units).max(0.0);
        *self
            .item_boxes
            .entry((a.product, a.format, a.size))
            .or_insert(0.0) += boxes as f64;
        self.size_pieces[a.size] += pieces;
        if params.mass_limit().is_some_and(|m| m.area == a.area) {
            let unit_weight = params.sizes()[a.size].avg_unit_weight_lb;
            self.mass_kg += pieces * product.kg_per_piece(unit_weight);
        }
    }
}

/// Product choice: a fixed product or a pointer into the rotation.
struct ProductPicker {
    sequence: Vec<usize>,
    fixed: bool,
    next: usize,
}

impl ProductPicker {
    fn new(params: &ParameterStore) -> Self {
        let heuristic = params.heuristic();
        match heuristic.default_product {
            Some(p) => Self {
                sequence: vec![p],
                fixed: true,
                next: 0,
            },
            None if !heuristic.rotation.is_empty() => Self {
                sequence: heuristic.rotation.clone(),
                fixed: false,
                next: 0,
            },
            None => Self {
                sequence: (0..params.products().len()).collect(),
                fixed: false,
                next: 0,
            },
        }
    }

    /// Products in the order they would be tried, starting at the pointer.
    fn candidates(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let len = self.sequence.len();
        (0..len).map(move |offset| {
            let pos = (self.next + offset) % len;
            (pos, self.sequence[pos])
        })
    }

    fn advance_past(&mut self, pos: usize) {
        if !self.fixed && !self.sequence.is_empty() {
            self.next = (pos + 1) % self.sequence.len();
        }
    }
}

/// Preferred format when it is offered for `size`, else the best-priced one.
fn pick_format(params: &ParameterStore, product: usize, size: usize) -> Option<usize> {
    let preferred = params
        .heuristic()
        .preferred_format
        .get(product)
        .copied()
        .flatten()
        .filter(|&k| params.pieces_per_box(k, size) > 0);
    if preferred.is_some() {
        return preferred;
    }
    let prices = &params.products()[product];
    (0..params.formats().len())
        .filter(|&k| params.pieces_per_box(k, size) > 0)
        .fold(None, |best: Option<usize>, k| match best {
            Some(b) if prices.price(b) >= prices.price(k) => Some(b),
            _ => Some(k),
        })
}

/// First allowed area in priority order that still has room.
fn pick_area(ledger: &Ledger<'_>, product: usize) -> Option<usize> {
    let params = ledger.params;
    params
        .heuristic()
        .area_priority
        .get(product)
        .into_iter()
        .flatten()
        .copied()
        .find(|&e| params.area_accepts(product, e) && ledger.area_free(e) > 0.0)
}

fn pick_assignment(
    ledger: &Ledger<'_>,
    picker: &ProductPicker,
    line: usize,
    size: usize,
) -> Option<(usize, Assignment)> {
    let params = ledger.params;
    picker.candidates().find_map(|(pos, p)| {
        if !params.product_allowed_on(p, line) {
            return None;
        }
        let format = pick_format(params, p, size)?;
        let area = pick_area(ledger, p)?;
        Some((
            pos,
            Assignment {
                product: p,
                line,
                area,
                format,
                size,
            },
        ))
    })
}

impl Allocator for GreedyAllocator {
    #[instrument(skip_all, fields(parameters_version = request.params().version()))]
    fn allocate(&self, request: &PlanningRequest) -> AllocationOutcome {
        let params = request.params();
        let mut notes: Vec<String> = params.diagnostics().to_vec();
        let mut ledger = Ledger::new(request);
        let mut picker = ProductPicker::new(params);
        let mut rows: Vec<PlanRow> = Vec::new();

        for size in 0..params.sizes().len() {
            if ledger.units_left[size] <= 0.0 {
                continue;
            }
            let label = &params.sizes()[size].label;

            let lines: Vec<usize> = (0..params.lines().len())
                .filter(|&j| params.line_accepts(j, size))
                .collect();
            if lines.is_empty() {
                notes.push(format!(
                    "Size class {}: no compatible line ({} raw units left unplanned).",
                    label,
                    request.availability().units(size)
                ));
                continue;
            }

            let free: Vec<f64> = lines.iter().map(|&j| ledger.line_free(j)).collect();
            let total_free: f64 = free.iter().sum();
            if total_free <= 0.0 {
                debug!(size = %label, "no free line capacity");
                continue;
            }

            let Some(reference) = picker
                .candidates()
                .map(|(_, p)| p)
                .find(|&p| pick_format(params, p, size).is_some())
            else {
                notes.push(format!(
                    "Size class {}: no product offers a box format for this size.",
                    label
                ));
                continue;
            };
            let reference = &params.products()[reference];
            let pieces_available =
                (ledger.units_left[size] * reference.pieces_per_unit * reference.yield_fraction)
                    .floor();

            for (&line, &line_free) in lines.iter().zip(&free) {
                let share = (pieces_available * line_free / total_free).floor();
                if share <= 0.0 {
                    continue;
                }
                let Some((pos, assignment)) = pick_assignment(&ledger, &picker, line, size) else {
                    debug!(size = %label, line = %params.lines()[line].id, "no admissible product");
                    continue;
                };
                picker.advance_past(pos);

                let pieces = share.min(ledger.piece_cap(assignment, request)).floor();
                let per_box = u64::from(params.pieces_per_box(assignment.format, size));
                let boxes = pieces as u64 / per_box;
                ledger.dropped_pieces += pieces as u64 - boxes * per_box;
                if boxes == 0 {
                    continue;
                }

                ledger.charge(assignment, boxes);
                rows.push(extractor::plan_row(params, assignment, boxes));
            }
        }

        rows.sort_by_key(|r| {
            let a = r.assignment;
            (a.line, a.product, a.size, a.area, a.format)
        });

        if ledger.dropped_pieces > 0 {
            notes.push(format!(
                "Heuristic rounding dropped {} pieces that did not fill a whole box.",
                ledger.dropped_pieces
            ));
        }

        let objective: f64 = rows
            .iter()
            .map(|r| {
                params.products()[r.assignment.product].box_value(r.assignment.format)
                    * r.box_count as f64
            })
            .sum();

        info!(
            rows = rows.len(),
            objective,
            dropped_pieces = ledger.dropped_pieces,
            "greedy allocation done"
        );

        if rows.is_empty() {
            notes.push("Heuristic allocated no boxes.".to_string());
            return AllocationOutcome::empty(SolutionStatus::Empty, notes);
        }

        AllocationOutcome {
            status: SolutionStatus::Feasible,
            rows,
            objective_value: Some(objective),
            notes,
        }
    }

    fn name(&self) -> &str {
        "greedy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Availability, DemandRow, DemandTable};
    use std::sync::Arc;

    fn scenario_a() -> ParameterStore {
        ParameterStore::builder()
            .product("FIL", 1.0, 1.0, 2.0)
            .line("L1", 1000.0)
            .line("L2", 800.0)
            .area("Fresco", 2000.0)
            .format("K5")
            .pieces_per_box("K5", 6, 5)
            .line_accepts("L1", 6)
            .line_accepts("L2", 6)
            .price("FIL", "K5", 10.0)
            .build()
            .unwrap()
    }

    fn request(params: ParameterStore, units: u64) -> PlanningRequest {
        let availability = Availability::zeros(14).with_units(6, units);
        PlanningRequest::new(Arc::new(params), availability).unwrap()
    }

    #[test]
    fn splits_pieces_by_free_line_capacity() {
        let outcome = GreedyAllocator::new().allocate(&request(scenario_a(), 500));

        assert_eq!(outcome.status, SolutionStatus::Feasible);
        let boxes: Vec<(String, u64)> = outcome
            .rows
            .iter()
            .map(|r| (r.line.clone(), r.box_count))
            .collect();
        // 1000 pieces split 555 / 444, floored to whole boxes of 5.
        assert_eq!(boxes, vec![("L1".to_string(), 111), ("L2".to_string(), 88)]);
        assert!(outcome.notes.iter().any(|n| n.contains("dropped 4 pieces")));
    }

    #[test]
    fn shares_are_capped_by_line_capacity() {
        let outcome = GreedyAllocator::new().allocate(&request(scenario_a(), 5000));
        let params = scenario_a();
        for (used, line) in extractor::pieces_per_line(&params, &outcome.rows)
            .into_iter()
            .zip(params.lines())
        {
            assert!(used as f64 <= line.capacity);
        }
        assert_eq!(outcome.rows.iter().map(|r| r.piece_count).sum::<u64>(), 1800);
    }

    #[test]
    fn demand_ceiling_limits_boxes() {
        let params = scenario_a();
        let demand = DemandTable::from_rows(
            &params,
            vec![DemandRow::Detailed {
                product: "FIL".into(),
                format: "K5".into(),
                size: crate::domain::SizeRef::Index(6),
                boxes: 50.0,
            }],
        )
        .unwrap();
        let outcome = GreedyAllocator::new().allocate(&request(params, 500).with_demand(demand));
        assert_eq!(outcome.rows.iter().map(|r| r.box_count).sum::<u64>(), 50);
    }

    #[test]
    fn rotation_alternates_products_across_lines() {
        let params = ParameterStore::builder()
            .product("A", 1.0, 1.0, 1.0)
            .product("B", 1.0, 1.0, 1.0)
            .line("L1", 100.0)
            .line("L2", 100.0)
            .area("E", 1000.0)
            .format("K")
            .pieces_per_box("K", 0, 10)
            .line_accepts("L1", 0)
            .line_accepts("L2", 0)
            .rotation_step("A", 1)
            .rotation_step("B", 1)
            .build()
            .unwrap();
        let availability = Availability::zeros(14).with_units(0, 200);
        let request = PlanningRequest::new(Arc::new(params), availability).unwrap();

        let outcome = GreedyAllocator::new().allocate(&request);
        let products: Vec<&str> = outcome.rows.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(products, vec!["A", "B"]);
    }

    #[test]
    fn size_without_line_is_noted() {
        let outcome = GreedyAllocator::new().allocate(&request(scenario_a(), 0));
        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.status, SolutionStatus::Empty);

        let params = scenario_a();
        let availability = Availability::zeros(14).with_units(2, 100);
        let request = PlanningRequest::new(Arc::new(params), availability).unwrap();
        let outcome = GreedyAllocator::new().allocate(&request);
        assert!(outcome
            .notes
            .iter()
            .any(|n| n.starts_with("Size class 3-4: no compatible line")));
    }
}
