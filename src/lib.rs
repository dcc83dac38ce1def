//! kb-scribe - Retrieval-Augmented Question Answering
//!
//! This crate implements a knowledge-base assistant whose answers are driven
//! by a small agent state machine: a tool-calling Researcher gathers facts,
//! and a Writer synthesizes the final answer from the accumulated transcript.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
