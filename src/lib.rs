//! # sentinel-search
//!
//! Command-line front end for the `resilient-search` engine.
//!
//! This crate owns everything around the engine: the TOML configuration
//! file and its environment overrides, building providers in the configured
//! order, and rendering responses for a terminal. The `sentinel-search`
//! binary wires these together.

pub mod app;
pub mod config;
pub mod error;
pub mod render;

pub use app::build_orchestrator;
pub use config::AppConfig;
pub use error::{AppError, Result};
