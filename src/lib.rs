//! rulebench — trading-rule DSL compiler and backtester.
//!
//! Turns a structured trading-rule description into a deterministic,
//! re-executable simulation: DSL parsing → AST → code generation →
//! backtest → report. Hexagonal architecture: domain logic in [`domain`],
//! port traits in [`ports`], concrete implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
