//! Configuration utilities.

/// `docrag.toml` loading, environment overrides and validation.
pub mod toml_config;
