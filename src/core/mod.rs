//! Core domain models
//!
//! This module defines the stages a pipeline is made of, the records that
//! carry their outcomes, and the configuration they are loaded from.

pub mod config;
pub mod guard;
pub mod pipeline;
pub mod record;
pub mod stage;

pub use guard::RunGuard;
pub use pipeline::*;
pub use record::*;
pub use stage::*;
