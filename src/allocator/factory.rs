use super::{ExactAllocator, GreedyAllocator};
use crate::domain::{AllocationStrategy, Allocator, PlannerSettings, PlanningError};
use std::sync::Arc;

/// Builds the allocator selected by the run settings.
pub struct AllocatorFactory;

impl AllocatorFactory {
    /// Fails only when the exact strategy asks for a backend that was not
    /// compiled in.
    pub fn create(settings: &PlannerSettings) -> Result<Arc<dyn Allocator>, PlanningError> {
        match settings.strategy {
            AllocationStrategy::Exact => Ok(Arc::new(ExactAllocator::from_settings(settings)?)),
            AllocationStrategy::Greedy => Ok(Arc::new(GreedyAllocator::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_is_always_available() {
        let settings = PlannerSettings {
            strategy: AllocationStrategy::Greedy,
            ..PlannerSettings::default()
        };
        let allocator = AllocatorFactory::create(&settings).unwrap();
        assert_eq!(allocator.name(), "greedy");
    }

    #[cfg(feature = "highs")]
    #[test]
    fn exact_uses_compiled_backend() {
        let allocator = AllocatorFactory::create(&PlannerSettings::default()).unwrap();
        assert_eq!(allocator.name(), "exact");
        let exact = ExactAllocator::from_settings(&PlannerSettings::default()).unwrap();
        assert_eq!(exact.solver_name(), "HiGHS");
    }

    #[cfg(not(any(feature = "highs", feature = "coin_cbc")))]
    #[test]
    fn exact_without_backend_is_rejected() {
        match AllocatorFactory::create(&PlannerSettings::default()) {
            Err(PlanningError::AllocatorNotAvailable(_)) => {}
            Err(other) => panic!("unexpected error: {}", other),
            Ok(allocator) => panic!("{} built without a solver backend", allocator.name()),
        }
    }
}
