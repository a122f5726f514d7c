//! Library interface for the keyhoist CLI
//!
//! Each command is a function taking a loaded [`Config`], so integration tests
//! can drive them without spawning the binary.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::{Context, Result};
use keyhoist_core::config::{CollisionPolicy, Config, GenerationMode};
use keyhoist_languages::csharp::container::append_entry;
use keyhoist_languages::{
    collect_package_references, run_extract, run_hoist, scan_tree, AppendOutcome, ContainerSpec,
    HoistReport,
};
use keyhoist_registry::{evaluate_packages, group_by_module, CaptionClient, NuGetRegistry};
use keyhoist_reports::sheets::{caption_sheets, extraction_sheet, package_sheet, scan_sheets};
use keyhoist_reports::Report;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub use keyhoist_core::config;

pub const EXTRACTION_REPORT: &str = "extraction.xlsx";
pub const SCAN_REPORT: &str = "scan.xlsx";
pub const PACKAGES_REPORT: &str = "packages.xlsx";
pub const CAPTIONS_REPORT: &str = "captions.xlsx";

/// Load configuration, apply the `--root` override and validate
pub fn load_config(config_path: Option<&Path>, root: Option<&Path>) -> Result<Config> {
    let mut config = Config::load(config_path).context("Failed to load configuration")?;
    if let Some(root) = root {
        config = config.with_root(root);
    }
    config.validate()?;
    Ok(config)
}

fn report_path(config: &Config, file: &str) -> PathBuf {
    config.reports.output_dir.join(file)
}

fn write_extraction_report(config: &Config, report: &HoistReport) -> Result<Option<PathBuf>> {
    if !config.reports.write_extraction_report {
        return Ok(None);
    }
    let path = report_path(config, EXTRACTION_REPORT);
    Report::new(vec![extraction_sheet(&report.mapping, &config.extract.root)])
        .write_xlsx(&path)?;
    Ok(Some(path))
}

/// Apply `--mode` / `--on-collision` command-line overrides
pub fn apply_overrides(
    config: &mut Config,
    mode: Option<GenerationMode>,
    on_collision: Option<CollisionPolicy>,
) {
    if let Some(mode) = mode {
        config.extract.mode = mode;
    }
    if let Some(policy) = on_collision {
        config.extract.on_collision = policy;
    }
}

/// `hoist`: extract, generate the container, rewrite call sites
pub fn hoist(config: &Config, dry_run: bool) -> Result<HoistReport> {
    let report = run_hoist(&config.extract, dry_run)?;
    if !dry_run {
        write_extraction_report(config, &report)?;
    }
    Ok(report)
}

/// `extract`: build the mapping and write the extraction report
pub fn extract(config: &Config) -> Result<HoistReport> {
    let report = run_extract(&config.extract)?;
    write_extraction_report(config, &report)?;
    Ok(report)
}

/// `add`: append one constant to the container
pub fn add(config: &Config, category: &str, key: &str) -> Result<AppendOutcome> {
    let spec = ContainerSpec::from_config(&config.extract);
    let outcome = append_entry(
        &config.extract.constants_path(),
        &spec,
        category,
        key,
        config.extract.on_collision,
    )?;
    Ok(outcome)
}

/// `scan`: run every configured pattern and write one sheet per pattern
pub fn scan(config: &Config) -> Result<PathBuf> {
    let results = scan_tree(
        &config.extract.root,
        &config.scan.patterns,
        &config.extract.exclude,
    )?;
    let path = report_path(config, SCAN_REPORT);
    Report::new(scan_sheets(&results, &config.extract.root)).write_xlsx(&path)?;
    Ok(path)
}

/// `packages`: evaluate every referenced NuGet package against the target framework
pub async fn packages(config: &Config) -> Result<PathBuf> {
    let references = collect_package_references(&config.extract.root, &config.extract.exclude)?;
    if references.is_empty() {
        warn!(
            "No PackageReference items found under {}",
            config.extract.root.display()
        );
    }
    let ids: Vec<String> = references.into_iter().map(|r| r.id).collect();
    info!(
        "Evaluating {} packages against {}",
        ids.len(),
        config.registry.target_framework
    );

    let registry = NuGetRegistry::new(&config.registry)?;
    let rows = evaluate_packages(&registry, &ids, &config.registry).await;

    let path = report_path(config, PACKAGES_REPORT);
    Report::new(vec![package_sheet(&config.registry.target_framework, &rows)]).write_xlsx(&path)?;
    Ok(path)
}

/// `captions`: fetch the caption list and write one sheet per module
pub async fn captions(config: &Config) -> Result<PathBuf> {
    let client = CaptionClient::new(&config.captions)?;
    let grouped = group_by_module(client.fetch().await?);

    let path = report_path(config, CAPTIONS_REPORT);
    Report::new(caption_sheets(&grouped)).write_xlsx(&path)?;
    Ok(path)
}

/// Human-readable summary of a hoist or extract run
pub fn format_summary(report: &HoistReport, dry_run: bool) -> String {
    let mut lines = Vec::new();
    let extraction = &report.extraction;

    lines.push(format!("Mode:                 {}", report.mode));
    lines.push(format!("Files scanned:        {}", extraction.files_scanned));
    lines.push(format!("Matched calls:        {}", extraction.matches));
    lines.push(format!("Filtered by category: {}", extraction.filtered));
    lines.push(format!(
        "Unique keys:          {} ({} new)",
        report.mapping.len(),
        report.added()
    ));

    if !extraction.parse_failures.is_empty() {
        lines.push(format!(
            "Skipped (parse):      {}",
            extraction.parse_failures.len()
        ));
        for failure in &extraction.parse_failures {
            lines.push(format!("  {}: {}", failure.path.display(), failure.message));
        }
    }

    for collision in report.mapping.collisions() {
        lines.push(format!(
            "Collision: '{}' and '{}' both map to {}; '{}' uses {}",
            collision.existing_key,
            collision.key,
            collision.identifier,
            collision.key,
            collision.assigned
        ));
    }

    if let Some(rewrite) = &report.rewrite {
        let verb = if dry_run { "Would rewrite" } else { "Rewrote" };
        lines.push(format!(
            "{verb} {} calls in {} files",
            rewrite.replacements,
            rewrite.files_rewritten.len()
        ));
        if report.container_changed {
            let verb = if dry_run { "Would update" } else { "Updated" };
            lines.push(format!("{verb} {}", report.constants_path.display()));
        }
    }

    lines.join("\n")
}

/// Console line for an `add` outcome
pub fn format_add_outcome(outcome: &AppendOutcome, path: &Path) -> String {
    match outcome {
        AppendOutcome::Added { identifier } => {
            format!("Added {identifier} to {}", path.display())
        }
        AppendOutcome::AlreadyPresent { identifier } => {
            format!("Already present as {identifier} in {}", path.display())
        }
        AppendOutcome::Created { identifier } => {
            format!("Created {} with {identifier}", path.display())
        }
    }
}
