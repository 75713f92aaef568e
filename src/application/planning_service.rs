use crate::allocator::AllocatorFactory;
use crate::domain::{
    AllocationStrategy, Allocator, PlanReport, PlannerSettings, PlanningError, PlanningRequest,
};
use crate::planning::extractor;
use std::sync::Arc;
use tracing::{info, instrument};

/// Application service: runs the configured allocator and wraps the result
/// into a [`PlanReport`].
pub struct PlanningService {
    allocator: Arc<dyn Allocator>,
    strategy: AllocationStrategy,
}

impl PlanningService {
    pub fn new(allocator: Arc<dyn Allocator>, strategy: AllocationStrategy) -> Self {
        Self {
            allocator,
            strategy,
        }
    }

    pub fn from_settings(settings: &PlannerSettings) -> Result<Self, PlanningError> {
        Ok(Self::new(AllocatorFactory::create(settings)?, settings.strategy))
    }

    pub fn strategy(&self) -> AllocationStrategy {
        self.strategy
    }

    #[instrument(
        skip_all,
        fields(strategy = %self.strategy, parameters_version = request.params().version())
    )]
    pub fn run(&self, request: &PlanningRequest) -> PlanReport {
        info!(
            total_units = request.availability().total(),
            demand = request.demand().is_some(),
            "planning run started"
        );
        let outcome = self.allocator.allocate(request);
        let report = extractor::into_report(request, self.strategy, outcome);
        info!(
            status = %report.status,
            rows = report.table.len(),
            total_boxes = report.kpis.total_boxes,
            notes = report.notes.len(),
            "planning run finished"
        );
        report
    }
}
