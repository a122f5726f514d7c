//! The extract → generate → rewrite pipeline behind `hoist` and `extract`

use crate::csharp::container::{insert_entries, read_container, write_container};
use crate::csharp::{
    CallExtractor, CallRewriter, ContainerSpec, ExtractionSummary, RewriteSummary, SentinelCall,
};
use crate::discovery::{discover_files, FileFilter};
use keyhoist_core::config::{ExtractConfig, GenerationMode};
use keyhoist_core::error::{Error, Result};
use keyhoist_core::mapping::{ConstantMapping, ConstantMappingBuilder};
use std::path::PathBuf;
use tracing::info;

/// Outcome of an extraction (and, for `hoist`, the generate and rewrite steps)
#[derive(Debug)]
pub struct HoistReport {
    pub extraction: ExtractionSummary,
    pub mapping: ConstantMapping,
    pub constants_path: PathBuf,
    pub mode: GenerationMode,
    /// Whether the constants file changed (or would change, in a dry run)
    pub container_changed: bool,
    /// Absent for extract-only runs
    pub rewrite: Option<RewriteSummary>,
}

impl HoistReport {
    /// Number of keys new in this run
    pub fn added(&self) -> usize {
        self.mapping.added().count()
    }
}

struct Extracted {
    files: Vec<PathBuf>,
    extraction: ExtractionSummary,
    mapping: ConstantMapping,
    existing: Option<String>,
}

fn extract(config: &ExtractConfig) -> Result<Extracted> {
    let constants_path = config.constants_path();
    let filter = FileFilter::new(&config.extensions, &config.exclude, config.respect_gitignore)?
        .skipping(&constants_path);
    let files = discover_files(&config.root, &filter)?;
    info!("Extracting from {} files under {}", files.len(), config.root.display());

    let mut extractor =
        CallExtractor::new(SentinelCall::from_config(config), config.skip_on_syntax_error)?;
    let extraction = extractor.extract_files(&files);

    let spec = ContainerSpec::from_config(config);
    let existing = match config.mode {
        GenerationMode::Append if constants_path.is_file() => Some(
            std::fs::read_to_string(&constants_path).map_err(|e| Error::io_at(&constants_path, e))?,
        ),
        _ => None,
    };

    let mut builder = ConstantMappingBuilder::new(config.on_collision);
    if existing.is_some() {
        let contents = read_container(&constants_path, &spec)?;
        for seed in contents.entries {
            builder.seed(seed);
        }
        for member in contents.members {
            builder.reserve_member(member);
        }
    }
    builder.observe_all(extraction.records);
    let mapping = builder.build()?;

    Ok(Extracted {
        files,
        extraction: extraction.summary,
        mapping,
        existing,
    })
}

/// Extract only: build the mapping without writing anything
pub fn run_extract(config: &ExtractConfig) -> Result<HoistReport> {
    let extracted = extract(config)?;
    Ok(HoistReport {
        extraction: extracted.extraction,
        mapping: extracted.mapping,
        constants_path: config.constants_path(),
        mode: config.mode,
        container_changed: false,
        rewrite: None,
    })
}

/// Extract, write the constants container, then rewrite call sites
pub fn run_hoist(config: &ExtractConfig, dry_run: bool) -> Result<HoistReport> {
    let Extracted {
        files,
        extraction,
        mapping,
        existing,
    } = extract(config)?;
    let constants_path = config.constants_path();
    let spec = ContainerSpec::from_config(config);

    let rendered = match &existing {
        Some(text) => insert_entries(text, &spec, mapping.added())?,
        None if mapping.is_empty() => String::new(),
        None => spec.render(mapping.entries()),
    };
    let container_changed = !rendered.is_empty() && existing.as_deref() != Some(rendered.as_str());

    if container_changed {
        if dry_run {
            info!(
                "Would write {} ({} constants)",
                constants_path.display(),
                mapping.len()
            );
        } else {
            write_container(&constants_path, &rendered)?;
            info!(
                "Wrote {} ({} constants, {} new)",
                constants_path.display(),
                mapping.len(),
                mapping.added().count()
            );
        }
    }

    let rewrite = {
        let mut rewriter = CallRewriter::new(
            SentinelCall::from_config(config),
            &mapping,
            config.container.clone(),
            config.skip_on_syntax_error,
        )?;
        rewriter.rewrite_files(&files, dry_run)?
    };

    Ok(HoistReport {
        extraction,
        mapping,
        constants_path,
        mode: config.mode,
        container_changed,
        rewrite: Some(rewrite),
    })
}
