//! Pipeline execution engine

pub mod engine;
pub mod executor;
pub mod policy;

pub use engine::{ExecutionEngine, RunReport};
pub use executor::{InvocationLevel, StageExecutor, StageHandle};
pub use policy::RunPolicy;
