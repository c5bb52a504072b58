//! CLI Integration Test Modules

pub mod toml_config;
pub mod validation;
