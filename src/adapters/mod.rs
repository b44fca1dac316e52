//! Concrete port implementations.

pub mod csv_data;
pub mod file_config_adapter;
pub mod passthrough_language;
pub mod sample_data;

#[cfg(feature = "web")]
pub mod web;
