//! Remote collaborators for the reporting commands
//!
//! - [`nuget`]: NuGet registration API client
//! - [`compat`]: target framework parsing and compatibility evaluation
//! - [`captions`]: authenticated caption list client
//!
//! Every request has a timeout and a bounded number of retries with
//! exponential backoff.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use async_trait::async_trait;
use keyhoist_core::config::RegistryConfig;
use keyhoist_core::error::Result;
use tracing::{info, warn};

pub mod captions;
pub mod compat;
pub mod error;
mod http;
pub mod nuget;

pub use captions::{group_by_module, Caption, CaptionClient};
pub use compat::{
    classify, evaluate, CompatibilityType, Evaluation, PackageReportRow, PackageVersion,
    TargetFramework,
};
pub use error::RegistryError;
pub use nuget::{NuGetRegistry, PackageMetadata, VersionInfo};

/// Source of package version metadata
#[async_trait]
pub trait PackageRegistry: Send + Sync {
    /// Fetch every version of a package
    async fn fetch(&self, package_id: &str) -> Result<PackageMetadata>;
}

/// Evaluate packages one at a time, turning failures into error rows
pub async fn evaluate_packages(
    registry: &dyn PackageRegistry,
    package_ids: &[String],
    config: &RegistryConfig,
) -> Vec<PackageReportRow> {
    let target = TargetFramework::parse(&config.target_framework);
    let mut rows = Vec::with_capacity(package_ids.len());

    for (i, id) in package_ids.iter().enumerate() {
        info!("[{}/{}] {id}", i + 1, package_ids.len());
        let row = match registry.fetch(id).await {
            Ok(metadata) => {
                let evaluation = evaluate(&metadata, &target, &config.policy);
                PackageReportRow::from_evaluation(id, &evaluation)
            }
            Err(e) => {
                warn!("Failed to evaluate {id}: {e}");
                PackageReportRow::error(id)
            }
        };
        rows.push(row);
    }
    rows
}
