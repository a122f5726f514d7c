//! NuGet registration API client
//!
//! `GET {base}/{id-lowercase}/index.json` returns pages of catalog entries.
//! Small packages inline every page; large ones only reference pages by `@id`,
//! which are fetched one at a time.

use crate::error::RegistryError;
use crate::http::JsonClient;
use crate::PackageRegistry;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset};
use keyhoist_core::config::RegistryConfig;
use keyhoist_core::error::Result;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Metadata of one published version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub version: String,
    /// Absent for unlisted versions, which the registry dates to 1900
    pub published: Option<DateTime<FixedOffset>>,
    pub listed: bool,
    /// `dependencyGroups[].targetFramework`, as declared
    pub target_frameworks: Vec<String>,
}

/// Every version the registry knows for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageMetadata {
    pub id: String,
    pub versions: Vec<VersionInfo>,
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    /// Absent when the page must be fetched separately
    #[serde(default)]
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationLeaf {
    catalog_entry: CatalogEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    version: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    listed: Option<bool>,
    #[serde(default)]
    dependency_groups: Vec<DependencyGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DependencyGroup {
    #[serde(default)]
    target_framework: Option<String>,
}

impl From<CatalogEntry> for VersionInfo {
    fn from(entry: CatalogEntry) -> Self {
        let published = entry
            .published
            .as_deref()
            .and_then(|p| DateTime::parse_from_rfc3339(p).ok())
            .filter(|p| p.year() > 1900);
        // The registry marks unlisted versions with a 1900 publish date
        let listed = entry.listed.unwrap_or(published.is_some() || entry.published.is_none());

        Self {
            version: entry.version,
            published,
            listed,
            target_frameworks: entry
                .dependency_groups
                .into_iter()
                .filter_map(|g| g.target_framework)
                .filter(|t| !t.trim().is_empty())
                .collect(),
        }
    }
}

/// Client for the NuGet v3 registration resource
pub struct NuGetRegistry {
    http: JsonClient,
    base_url: String,
}

impl NuGetRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        info!("Initializing NuGet registry client");
        info!("  Base URL: {}", config.base_url);
        info!("  Timeout: {}s", config.timeout_secs);

        Ok(Self {
            http: JsonClient::new(config.timeout_secs, config.retry_attempts)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Override the initial retry backoff
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.http = self.http.with_backoff(backoff);
        self
    }

    fn index_url(&self, package_id: &str) -> String {
        format!("{}/{}/index.json", self.base_url, package_id.to_lowercase())
    }

    async fn fetch_metadata(&self, package_id: &str) -> std::result::Result<PackageMetadata, RegistryError> {
        let index: RegistrationIndex = self.http.get_json(&self.index_url(package_id), None).await?;

        let mut versions = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => {
                    debug!("Fetching registration page {}", page.id);
                    let page: RegistrationPage = self.http.get_json(&page.id, None).await?;
                    page.items.unwrap_or_default()
                }
            };
            versions.extend(leaves.into_iter().map(|leaf| VersionInfo::from(leaf.catalog_entry)));
        }

        debug!("{package_id}: {} versions", versions.len());
        Ok(PackageMetadata {
            id: package_id.to_string(),
            versions,
        })
    }
}

#[async_trait]
impl PackageRegistry for NuGetRegistry {
    async fn fetch(&self, package_id: &str) -> Result<PackageMetadata> {
        Ok(self.fetch_metadata(package_id).await?)
    }
}
