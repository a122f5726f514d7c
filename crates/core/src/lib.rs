//! Core types for keyhoist
//!
//! This crate provides the foundational pieces shared by the extraction,
//! rewrite, registry and report crates:
//!
//! - **Entities**: matched lookup calls, source locations, generated constants
//! - **Identifiers**: pure key → identifier synthesis and the collision registry
//! - **Mapping**: the immutable key → constant mapping used by every pass
//! - **Configuration**: layered TOML + environment configuration
//! - **Error handling**: Unified error types
//!

pub mod config;
pub mod entities;
pub mod error;
pub mod identifier;
pub mod mapping;

// Re-export main types for convenience
pub use config::{
    CaptionsConfig, CollisionPolicy, CompatibilityPolicy, Config, ExtractConfig, GenerationMode,
    RegistryConfig, ReportsConfig, ScanConfig, ScanPattern,
};
pub use entities::{ConstantEntry, MatchRecord, SourceLocation};
pub use error::{Error, Result, ResultExt};
pub use identifier::{
    make_property_name, Collision, IdentifierRegistry, NamingStrategy, UpperSnakeCase,
};
pub use mapping::{ConstantMapping, ConstantMappingBuilder, SeedEntry};
