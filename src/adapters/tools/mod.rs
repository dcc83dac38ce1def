//! Tool suite adapters.

mod builtin;
mod calculator;

pub use builtin::BuiltinToolExecutor;
pub use calculator::{evaluate, CalcError};
