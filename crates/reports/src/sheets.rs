//! Builders turning command results into sheets

use crate::{Cell, Sheet};
use keyhoist_core::mapping::ConstantMapping;
use keyhoist_languages::ScanHit;
use keyhoist_registry::{Caption, PackageReportRow};
use std::collections::BTreeMap;
use std::path::Path;

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// `Category | Key | File | Line`, one row per key at its first occurrence
///
/// Keys only known from a previous run's container have no location and are
/// left out.
pub fn extraction_sheet(mapping: &ConstantMapping, root: &Path) -> Sheet {
    let mut sheet = Sheet::new("Extraction", &["Category", "Key", "File", "Line"]);
    for entry in mapping.entries() {
        let Some(location) = entry.first_location() else {
            continue;
        };
        sheet.push_row(vec![
            entry.category.as_str().into(),
            entry.raw_key.as_str().into(),
            display_path(&location.file, root).into(),
            location.line.into(),
        ]);
    }
    sheet
}

/// One sheet per pattern: `Pattern | Match | File | Line`
pub fn scan_sheets(results: &[(String, Vec<ScanHit>)], root: &Path) -> Vec<Sheet> {
    results
        .iter()
        .map(|(name, hits)| {
            let mut sheet = Sheet::new(name.as_str(), &["Pattern", "Match", "File", "Line"]);
            for hit in hits {
                sheet.push_row(vec![
                    hit.pattern.as_str().into(),
                    hit.value.as_str().into(),
                    display_path(&hit.file, root).into(),
                    hit.line.into(),
                ]);
            }
            sheet
        })
        .collect()
}

/// Package compatibility against `target_framework`
pub fn package_sheet(target_framework: &str, rows: &[PackageReportRow]) -> Sheet {
    let compatible = format!("{target_framework} Compatible");
    let mut sheet = Sheet::new(
        "Packages",
        &[
            "Package",
            compatible.as_str(),
            "Latest Compatible Version",
            "Published Date",
            "Compatibility Type",
            "Registry Link",
        ],
    );
    for row in rows {
        sheet.push_row(vec![
            row.package.as_str().into(),
            row.compatible.as_str().into(),
            row.version.as_str().into(),
            row.published.as_str().into(),
            row.compatibility_type.as_str().into(),
            row.link.as_str().into(),
        ]);
    }
    sheet
}

/// One sheet per module: `Id | Label | Caption | Language`
pub fn caption_sheets(grouped: &BTreeMap<String, Vec<Caption>>) -> Vec<Sheet> {
    grouped
        .iter()
        .map(|(module, captions)| {
            let name = if module.trim().is_empty() {
                "(no module)"
            } else {
                module.as_str()
            };
            let mut sheet = Sheet::new(name, &["Id", "Label", "Caption", "Language"]);
            for caption in captions {
                sheet.push_row(vec![
                    caption.id.as_str().into(),
                    caption.label.as_str().into(),
                    caption.caption.as_str().into(),
                    caption.language.as_str().into(),
                ]);
            }
            sheet
        })
        .collect()
}
