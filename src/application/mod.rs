// Application layer: configuration and input loading, run orchestration and
// the background worker.

pub mod config_loader;
pub mod input_loader;
pub mod planning_service;
pub mod worker;

pub use planning_service::PlanningService;
pub use worker::{JobCompletion, JobToken, PlanningWorker};
