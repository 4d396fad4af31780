//! Shared types, error model, and configuration for pipelens.
//!
//! This crate is the foundation depended on by all other pipelens crates.
//! It provides:
//! - The unified error type, [`PipelensError`]
//! - Domain types ([`EventRow`], [`YearMonth`], [`Selection`], [`FilterCriteria`])
//! - Configuration ([`AppConfig`], [`ColumnsConfig`], [`ColumnAliases`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ColumnAliases, ColumnsConfig, DefaultsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{PipelensError, Result};
pub use types::{ALL_SENTINEL, EventRow, FilterCriteria, OptionalFields, Selection, YearMonth};
