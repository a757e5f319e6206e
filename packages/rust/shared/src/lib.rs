//! Shared types, error model, and configuration for the advisory generator.
//!
//! This crate is the foundation depended on by all other advisorygen crates.
//! It provides:
//! - [`AdvisoryError`] — the unified error type
//! - Domain types ([`AdvisoryRecord`], [`Category`], [`RiskLevel`], [`RequiredField`])
//! - Configuration ([`GeneratorConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{GeneratorConfig, IndexPolicy, RunConfig, load_config_from};
pub use error::{AdvisoryError, Result};
pub use types::{
    Acknowledgment, AdvisoryRecord, AffectedVersion, Category, LooseInt, RequiredField, RiskLevel,
};
