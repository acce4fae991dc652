//! Shared types, error model, and configuration for clubfeed.
//!
//! This crate is the foundation depended on by all other clubfeed crates.
//! It provides:
//! - The unified error type, [`ClubfeedError`]
//! - Domain types ([`CanonicalRecord`], [`Club`], [`Taxonomy`])
//! - Configuration ([`AppConfig`], [`IngestConfig`], [`FeedConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ColumnSchema, EmptySheetPolicy, FeedConfig, FeedSettings, IngestConfig,
    MappingConfig, PathsConfig, SourcesConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{ClubfeedError, Result};
pub use types::{
    CanonicalRecord, Club, Concept, DEFAULT_LICENSE, GeoCoordinates, ImageObject,
    LocationFeatureSpecification, Logo, OPENACTIVE_CONTEXT, Organization, Place, PostalAddress,
    RecordKind, RecordState, Taxonomy, TaxonomyConcept,
};
