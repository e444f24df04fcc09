#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Built-in statistical domains.
//!
//! Each domain pairs a category enumeration from [`categories`] with an
//! embedded TOML definition (labels, groups, composite scores, narrative
//! templates). The [`registry`] dispatches raw rows to the right category
//! type so callers only deal with [`Domain`] keys.

pub mod categories;
pub mod domain_config;
pub mod registry;

use thiserror::Error;
use ward_stats_engine::ConfigError;

pub use domain_config::{DomainConfig, parse_domain_toml};
pub use registry::{
    Domain, DomainReport, DomainSummary, RunOptions, describe, run_domain, validate_domain_toml,
};

/// Errors raised while loading a domain or running its pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The domain TOML could not be parsed.
    #[error("Failed to parse domain config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The domain config parsed but does not validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No domain is registered under this key.
    #[error("Unknown domain '{0}'")]
    UnknownDomain(String),

    /// The result could not be serialized.
    #[error("Failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}
