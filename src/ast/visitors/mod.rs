//! Ready-to-use tree visitors.

pub mod aggregate;
pub mod variable;

pub use aggregate::AggregateCollector;
pub use variable::VariableCollector;
