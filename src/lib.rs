// Domain layer: planning entities, inputs, the LP model and service contracts
pub mod domain;

// Planning layer: variable space, constraint model and plan extraction
pub mod planning;

// Allocation strategies: exact MIP and greedy heuristic
pub mod allocator;

// Solver adapters: concrete implementations of SolverService
pub mod solver;

// Application layer: loaders, run orchestration and the background worker
pub mod application;

// Infrastructure layer: logging and diagnostic artifacts
pub mod infrastructure;

// Re-export commonly used types
pub use domain::{
    AllocationStrategy, Allocator, Availability, DemandTable, ParameterStore, PlanKpis,
    PlanReport, PlanRow, PlanTable, PlannerSettings, PlanningError, PlanningRequest,
    SolutionStatus, SolverBackend, SolverError, SolverService,
};

pub use allocator::{AllocatorFactory, ExactAllocator, GreedyAllocator};
pub use application::{JobCompletion, JobToken, PlanningService, PlanningWorker};
pub use planning::{ConstraintModel, VariableSpace};
pub use solver::SolverFactory;
