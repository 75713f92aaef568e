// Domain module: planning entities, the LP model and the service contracts

pub mod allocator;
pub mod inputs;
pub mod models;
pub mod parameters;
pub mod plan;
pub mod solver_service;
pub mod value_objects;

pub use allocator::{AllocationOutcome, Allocator, PlanningError, PlanningRequest};
pub use inputs::*;
pub use models::*;
pub use parameters::*;
pub use plan::*;
pub use solver_service::{SolverError, SolverService};
pub use value_objects::*;
