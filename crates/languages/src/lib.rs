#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

//! Source-level passes for keyhoist
//!
//! - [`csharp`]: tree-sitter based matching, extraction, rewriting and the
//!   generated constants container
//! - [`discovery`]: file walking with extension and exclude filters
//! - [`hoist`]: the extract → generate → rewrite pipeline
//! - [`msbuild`] and [`scan`]: project-file and regex scanners for reports

pub mod csharp;
pub mod discovery;
pub mod hoist;
pub mod msbuild;
pub mod scan;

pub use csharp::{
    AppendOutcome, CallExtractor, CallMatcher, CallRewriter, ContainerSpec, ExtractionSummary,
    RewriteResult, RewriteSummary, SentinelCall,
};
pub use discovery::{discover_files, FileFilter};
pub use hoist::{run_extract, run_hoist, HoistReport};
pub use msbuild::{collect_package_references, PackageReference};
pub use scan::{scan_tree, ScanHit};
