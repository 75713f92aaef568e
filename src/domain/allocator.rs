// Allocator capability: one contract, two strategies (exact MIP and greedy).
// Callers choose a strategy through `PlannerSettings`; inputs, row shape and
// notes are identical for both.

use super::inputs::{Availability, DemandTable};
use super::parameters::ParameterStore;
use super::plan::PlanRow;
use super::value_objects::SolutionStatus;
use std::sync::Arc;

/// Errors that stop a run before it starts.
///
/// Solve-time failures are never reported through this type: allocators
/// degrade them to an empty plan plus a note.
#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Allocator not available: {0}")]
    AllocatorNotAvailable(String),
}

pub type Result<T> = std::result::Result<T, PlanningError>;

/// Everything one allocation run reads. The parameter snapshot is shared and
/// never mutated.
#[derive(Debug, Clone)]
pub struct PlanningRequest {
    params: Arc<ParameterStore>,
    availability: Availability,
    demand: Option<DemandTable>,
}

impl PlanningRequest {
    pub fn new(params: Arc<ParameterStore>, availability: Availability) -> Result<Self> {
        if availability.len() != params.sizes().len() {
            return Err(PlanningError::InputValidation(format!(
                "Availability covers {} size classes, configuration has {}",
                availability.len(),
                params.sizes().len()
            )));
        }
        Ok(Self {
            params,
            availability,
            demand: None,
        })
    }

    /// Attach demand ceilings. An empty table is treated as no table.
    pub fn with_demand(mut self, demand: DemandTable) -> Self {
        self.demand = if demand.is_empty() { None } else { Some(demand) };
        self
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn demand(&self) -> Option<&DemandTable> {
        self.demand.as_ref()
    }
}

/// Raw result of an allocator, before KPIs are attached.
#[derive(Debug, Clone)]
pub struct AllocationOutcome {
    pub status: SolutionStatus,
    pub rows: Vec<PlanRow>,
    pub objective_value: Option<f64>,
    pub notes: Vec<String>,
}

impl AllocationOutcome {
    pub fn empty(status: SolutionStatus, notes: Vec<String>) -> Self {
        Self {
            status,
            rows: Vec::new(),
            objective_value: None,
            notes,
        }
    }
}

/// Domain service interface for allocation strategies.
///
/// `allocate` never fails: infeasibility and engine errors come back as an
/// empty or partial outcome with notes.
pub trait Allocator: Send + Sync {
    fn allocate(&self, request: &PlanningRequest) -> AllocationOutcome;

    fn name(&self) -> &str;
}
