// Exact allocation: build the MIP, hand it to a `SolverService`, read back
// box counts.
//
// Only an optimal solution or a time-limited run holding a feasible
// incumbent produce a plan. Every other outcome is a solve failure: the
// attempted model and a trace go to a diagnostic artifact, and the caller gets
// an empty plan with a note. Nothing is raised past `Allocator::allocate`.

use crate::domain::{
    AllocationOutcome, Allocator, OptimizationProblem, PlannerSettings, PlanningError,
    PlanningRequest, SolutionStatus, SolverConfig, SolverService,
};
use crate::infrastructure::DiagnosticSink;
use crate::planning::{extractor, ConstraintModel};
use crate::solver::SolverFactory;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Variable values at or below this are solver noise.
pub const NOISE_FLOOR: f64 = 1e-9;

pub struct ExactAllocator {
    solver: Arc<dyn SolverService>,
    config: SolverConfig,
    diagnostics: DiagnosticSink,
}

impl ExactAllocator {
    pub fn new(
        solver: Arc<dyn SolverService>,
        config: SolverConfig,
        diagnostics: DiagnosticSink,
    ) -> Self {
        Self {
            solver,
            config,
            diagnostics,
        }
    }

    /// Picks the engine named in `settings`; fails if it was not compiled in.
    pub fn from_settings(settings: &PlannerSettings) -> Result<Self, PlanningError> {
        let solver = SolverFactory::create_from_backend(settings.backend)
            .map_err(|e| PlanningError::AllocatorNotAvailable(e.to_string()))?;
        let config = SolverConfig {
            time_limit: settings.time_limit_secs,
            gap_tolerance: settings.mip_gap,
            verbose: false,
        };
        Ok(Self::new(
            solver,
            config,
            DiagnosticSink::new(settings.diagnostics_dir.clone()),
        ))
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    fn fail(
        &self,
        problem: &OptimizationProblem,
        status: SolutionStatus,
        reason: &str,
        mut notes: Vec<String>,
    ) -> AllocationOutcome {
        warn!(solver = self.solver_name(), %status, reason, "exact solve failed");
        let trace = vec![
            format!("solver: {}", self.solver_name()),
            format!("problem: {}", problem.name),
            format!(
                "variables: {}, constraints: {}",
                problem.num_variables(),
                problem.constraints.len()
            ),
            format!("status: {}", status),
            format!("reason: {}", reason),
        ];
        match self.diagnostics.record_solve_failure(problem, &trace) {
            Ok(path) => notes.push(format!(
                "Solve failed ({}). Diagnostic trace saved to {}.",
                reason,
                path.display()
            )),
            Err(e) => {
                warn!(
                    error = %e,
                    dir = %self.diagnostics.dir().display(),
                    "could not write diagnostic artifact"
                );
                notes.push(format!(
                    "Solve failed ({}). The diagnostic trace could not be written: {}.",
                    reason, e
                ));
            }
        }
        AllocationOutcome::empty(status, notes)
    }
}

impl Allocator for ExactAllocator {
    #[instrument(skip_all, fields(solver = self.solver_name()))]
    fn allocate(&self, request: &PlanningRequest) -> AllocationOutcome {
        let params = request.params();
        let mut notes: Vec<String> = params.diagnostics().to_vec();

        let model = ConstraintModel::build(request, self.config.clone());
        notes.extend(model.notes().iter().cloned());

        if model.is_empty() {
            notes.push("No valid results: no admissible assignments.".to_string());
            return AllocationOutcome::empty(SolutionStatus::Empty, notes);
        }

        let problem = model.problem();
        let solution = match self.solver.solve(problem) {
            Ok(solution) if solution.is_usable() => solution,
            Ok(solution) => {
                let reason = format!("status {}: {}", solution.status, solution.message);
                return self.fail(problem, solution.status, &reason, notes);
            }
            Err(e) => return self.fail(problem, SolutionStatus::Error, &e.to_string(), notes),
        };

        if solution.status == SolutionStatus::TimeLimit {
            notes.push(
                "Time limit reached: the plan is the best incumbent found, optimality not proven."
                    .to_string(),
            );
        }

        let mut rows = Vec::new();
        for (a, &value) in model.assignments().iter().zip(&solution.variable_values) {
            if value <= NOISE_FLOOR {
                continue;
            }
            let boxes = value.round();
            if boxes < 1.0 {
                continue;
            }
            rows.push(extractor::plan_row(params, *a, boxes as u64));
        }

        let objective = problem
            .objective
            .evaluate(&solution.variable_values.iter().map(|v| v.round()).collect::<Vec<_>>());

        if rows.is_empty() {
            notes.push("No valid results (all variables are zero).".to_string());
        } else {
            notes.push(format!(
                "Optimization finished. Objective value = {:.2}",
                objective
            ));
        }

        info!(
            status = %solution.status,
            rows = rows.len(),
            objective,
            solve_time_ms = solution.statistics.solve_time_ms,
            "exact allocation done"
        );

        AllocationOutcome {
            status: solution.status,
            rows,
            objective_value: Some(objective),
            notes,
        }
    }

    fn name(&self) -> &str {
        "exact"
    }
}
