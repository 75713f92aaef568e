// Allocation strategies behind the domain `Allocator` trait.

pub mod exact;
pub mod factory;
pub mod greedy;

pub use exact::ExactAllocator;
pub use factory::AllocatorFactory;
pub use greedy::GreedyAllocator;
