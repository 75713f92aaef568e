// Planning model: admissible tuples, MIP formulation, result extraction

pub mod constraint_model;
pub mod extractor;
pub mod variable_space;

pub use constraint_model::ConstraintModel;
pub use variable_space::VariableSpace;
