//! Adapters - concrete implementations of the ports.

pub mod ai;
pub mod http;
pub mod retrieval;
pub mod sqlite;
pub mod tools;
