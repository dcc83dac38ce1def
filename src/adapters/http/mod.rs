//! HTTP adapter - axum routes over the application services.

mod dto;
mod handlers;
mod routes;

pub use routes::{router, AppState};
