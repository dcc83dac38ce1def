//! Domain layer - pure business logic with no I/O.

pub mod agent;
pub mod foundation;
pub mod tools;
