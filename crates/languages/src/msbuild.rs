//! `PackageReference` items from MSBuild project files

use crate::discovery::{discover_files, FileFilter};
use keyhoist_core::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

static PACKAGE_REFERENCE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)<PackageReference\b([^>]*?)(?:/>|>(.*?)</PackageReference\s*>)").ok()
});
static ATTRIBUTE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).ok());
static VERSION_ELEMENT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<Version>\s*(.*?)\s*</Version>").ok());

/// One `<PackageReference Include="..." Version="..."/>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReference {
    pub id: String,
    pub version: Option<String>,
    /// Project files referencing the package
    pub projects: Vec<PathBuf>,
}

/// Parse the package references of one project file
pub fn parse_package_references(text: &str) -> Vec<(String, Option<String>)> {
    let (Some(reference), Some(attribute), Some(version_element)) = (
        PACKAGE_REFERENCE.as_ref(),
        ATTRIBUTE.as_ref(),
        VERSION_ELEMENT.as_ref(),
    ) else {
        return Vec::new();
    };

    reference
        .captures_iter(text)
        .filter_map(|caps| {
            let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let mut id = None;
            let mut version = None;
            for attr in attribute.captures_iter(attributes) {
                match &attr[1] {
                    "Include" => id = Some(attr[2].trim().to_string()),
                    "Version" => version = Some(attr[2].trim().to_string()),
                    _ => {}
                }
            }
            if version.is_none() {
                version = caps
                    .get(2)
                    .and_then(|body| version_element.captures(body.as_str()))
                    .map(|v| v[1].to_string());
            }
            id.filter(|id| !id.is_empty()).map(|id| (id, version))
        })
        .collect()
}

/// Collect package references from every `.csproj` under `root`
///
/// Packages are merged case-insensitively by id and returned sorted by id.
pub fn collect_package_references(root: &Path, exclude: &[String]) -> Result<Vec<PackageReference>> {
    let filter = FileFilter::new(&["csproj".to_string()], exclude, false)?;
    let projects = discover_files(root, &filter)?;

    let mut packages: BTreeMap<String, PackageReference> = BTreeMap::new();
    for project in projects {
        let text = match std::fs::read_to_string(&project) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", project.display(), Error::io_at(&project, e));
                continue;
            }
        };
        let found = parse_package_references(&text);
        debug!("{}: {} package references", project.display(), found.len());

        for (id, version) in found {
            let entry = packages
                .entry(id.to_lowercase())
                .or_insert_with(|| PackageReference {
                    id: id.clone(),
                    version: None,
                    projects: Vec::new(),
                });
            if entry.version.is_none() {
                entry.version = version;
            }
            if !entry.projects.contains(&project) {
                entry.projects.push(project.clone());
            }
        }
    }

    Ok(packages.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_attribute_and_element_forms() {
        let text = r#"<Project Sdk="Microsoft.NET.Sdk">
  <ItemGroup>
    <PackageReference Include="Newtonsoft.Json" Version="13.0.3" />
    <PackageReference Version="2.0.1" Include="Xamarin.Essentials"/>
    <PackageReference Include="Refit">
      <Version>7.0.0</Version>
    </PackageReference>
    <PackageReference Include="NoVersion" />
    <ProjectReference Include="..\Core\Core.csproj" />
  </ItemGroup>
</Project>"#;
        assert_eq!(
            parse_package_references(text),
            vec![
                ("Newtonsoft.Json".to_string(), Some("13.0.3".to_string())),
                ("Xamarin.Essentials".to_string(), Some("2.0.1".to_string())),
                ("Refit".to_string(), Some("7.0.0".to_string())),
                ("NoVersion".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_collect_merges_projects() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("App")).unwrap();
        std::fs::create_dir_all(root.join("Core")).unwrap();
        std::fs::write(
            root.join("App/App.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="Refit" Version="7.0.0" /></ItemGroup></Project>"#,
        )
        .unwrap();
        std::fs::write(
            root.join("Core/Core.csproj"),
            r#"<Project><ItemGroup><PackageReference Include="refit" Version="7.0.0" /><PackageReference Include="Akavache" Version="9.1.20" /></ItemGroup></Project>"#,
        )
        .unwrap();

        let packages = collect_package_references(root, &["bin".to_string()]).unwrap();
        let ids: Vec<&str> = packages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["Akavache", "Refit"]);
        assert_eq!(packages[1].projects.len(), 2);
    }
}
