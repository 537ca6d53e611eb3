//! The scheduling core: constraint model, backtracking engine, validator,
//! and exporter, plus their HTTP handlers.

pub mod constraints;
pub mod engine;
pub mod exporter;
pub mod handlers;
pub mod validator;
