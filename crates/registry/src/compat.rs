//! Target framework parsing and package compatibility evaluation

use crate::nuget::{PackageMetadata, VersionInfo};
use keyhoist_core::config::CompatibilityPolicy;
use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// A parsed target framework moniker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetFramework {
    /// `net5.0` and later; the platform suffix (`-android34.0`) is kept aside
    Net {
        major: u32,
        minor: u32,
        platform: Option<String>,
    },
    NetStandard { major: u32, minor: u32 },
    NetCoreApp { major: u32, minor: u32 },
    /// `.NETFramework4.5`, `net472`, ...
    NetFramework(String),
    Other(String),
}

impl TargetFramework {
    /// Parse both short (`net8.0`) and registry (`.NETStandard2.0`) spellings
    pub fn parse(moniker: &str) -> Self {
        let lower = moniker.trim().trim_start_matches('.').to_ascii_lowercase();
        let (base, platform) = match lower.split_once('-') {
            Some((base, platform)) => (base, Some(platform.to_string())),
            None => (lower.as_str(), None),
        };

        if let Some(version) = base.strip_prefix("netstandard") {
            if let Some((major, minor)) = parse_major_minor(version) {
                return Self::NetStandard { major, minor };
            }
        } else if let Some(version) = base.strip_prefix("netcoreapp") {
            if let Some((major, minor)) = parse_major_minor(version) {
                return Self::NetCoreApp { major, minor };
            }
        } else if base.starts_with("netframework") {
            return Self::NetFramework(lower);
        } else if let Some(version) = base.strip_prefix("net") {
            if version.contains('.') {
                if let Some((major, minor)) = parse_major_minor(version) {
                    if major >= 5 {
                        return Self::Net {
                            major,
                            minor,
                            platform,
                        };
                    }
                }
            } else if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) {
                return Self::NetFramework(lower);
            }
        }
        Self::Other(lower)
    }
}

fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = match parts.next() {
        Some(minor) => minor.parse().ok()?,
        None => 0,
    };
    Some((major, minor))
}

/// How a package version relates to the target framework
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityType {
    /// A dependency group targets the framework itself
    Direct,
    /// A dependency group targets an older `netX.Y`
    ForwardCompatible,
    /// A dependency group targets `netstandard2.0` or `netstandard2.1`
    NetStandard,
    /// The version declares no dependency groups
    NoFrameworkDeclared,
    Incompatible,
}

impl CompatibilityType {
    pub fn is_compatible(self) -> bool {
        self != Self::Incompatible
    }
}

impl fmt::Display for CompatibilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Direct => "Direct",
            Self::ForwardCompatible => "Forward compatible",
            Self::NetStandard => ".NET Standard",
            Self::NoFrameworkDeclared => "No framework declared",
            Self::Incompatible => "Incompatible",
        };
        f.write_str(label)
    }
}

/// Classify one version's declared targets against `target`
pub fn classify(
    targets: &[String],
    target: &TargetFramework,
    policy: &CompatibilityPolicy,
) -> CompatibilityType {
    if targets.is_empty() {
        return if policy.treat_no_dependency_groups_as_compatible {
            CompatibilityType::NoFrameworkDeclared
        } else {
            CompatibilityType::Incompatible
        };
    }

    let parsed: Vec<TargetFramework> = targets.iter().map(|t| TargetFramework::parse(t)).collect();
    let target_version = match target {
        TargetFramework::Net { major, minor, .. } => Some((*major, *minor)),
        _ => None,
    };

    let net_versions = parsed.iter().filter_map(|tf| match tf {
        TargetFramework::Net { major, minor, .. } => Some((*major, *minor)),
        _ => None,
    });

    let mut forward = false;
    for version in net_versions {
        match target_version.map(|t| version.cmp(&t)) {
            Some(Ordering::Equal) => return CompatibilityType::Direct,
            Some(Ordering::Less) => forward = true,
            _ => {}
        }
    }
    if forward && policy.allow_forward_compatible {
        return CompatibilityType::ForwardCompatible;
    }

    let netstandard = parsed.iter().any(|tf| {
        matches!(
            tf,
            TargetFramework::NetStandard { major: 2, minor: 0 | 1 }
        )
    });
    if netstandard && policy.allow_netstandard {
        return CompatibilityType::NetStandard;
    }

    CompatibilityType::Incompatible
}

/// A NuGet version: up to four numeric parts plus an optional prerelease tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageVersion {
    parts: [u64; 4],
    pre: Prerelease,
}

impl PackageVersion {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.split_once('+').map(|(v, _)| v).unwrap_or(text);
        let (numbers, pre) = match text.split_once('-') {
            Some((numbers, pre)) => (numbers, Prerelease::new(pre).ok()?),
            None => (text, Prerelease::EMPTY),
        };

        let mut parts = [0u64; 4];
        let mut count = 0;
        for piece in numbers.split('.') {
            if count == 4 {
                return None;
            }
            parts[count] = piece.parse().ok()?;
            count += 1;
        }
        Some(Self { parts, pre })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts).then_with(|| {
            match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            }
        })
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The newest version that passes the policy, and how it is compatible
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub version: Option<VersionInfo>,
    pub compatibility: CompatibilityType,
}

/// Walk versions newest first and return the first compatible one
pub fn evaluate(
    metadata: &PackageMetadata,
    target: &TargetFramework,
    policy: &CompatibilityPolicy,
) -> Evaluation {
    let mut candidates: Vec<(PackageVersion, &VersionInfo)> = metadata
        .versions
        .iter()
        .filter_map(|v| PackageVersion::parse(&v.version).map(|parsed| (parsed, v)))
        .filter(|(parsed, _)| policy.include_prerelease || !parsed.is_prerelease())
        .filter(|(_, v)| !policy.require_listed || v.listed)
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, info) in candidates {
        let compatibility = classify(&info.target_frameworks, target, policy);
        if compatibility.is_compatible() {
            return Evaluation {
                version: Some(info.clone()),
                compatibility,
            };
        }
    }

    Evaluation {
        version: None,
        compatibility: CompatibilityType::Incompatible,
    }
}

/// One row of the package compatibility report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReportRow {
    pub package: String,
    /// `Yes`, `No` or `Error`
    pub compatible: String,
    pub version: String,
    pub published: String,
    pub compatibility_type: String,
    pub link: String,
}

const GALLERY_URL: &str = "https://www.nuget.org/packages";

impl PackageReportRow {
    pub fn from_evaluation(package: &str, evaluation: &Evaluation) -> Self {
        match &evaluation.version {
            Some(info) => Self {
                package: package.to_string(),
                compatible: "Yes".to_string(),
                version: info.version.clone(),
                published: info
                    .published
                    .map(|p| p.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
                compatibility_type: evaluation.compatibility.to_string(),
                link: format!("{GALLERY_URL}/{package}/{}", info.version),
            },
            None => Self {
                package: package.to_string(),
                compatible: "No".to_string(),
                version: "None".to_string(),
                published: "N/A".to_string(),
                compatibility_type: CompatibilityType::Incompatible.to_string(),
                link: format!("{GALLERY_URL}/{package}"),
            },
        }
    }

    /// Row for a package whose metadata could not be fetched
    pub fn error(package: &str) -> Self {
        Self {
            package: package.to_string(),
            compatible: "Error".to_string(),
            version: "Unknown".to_string(),
            published: "Unknown".to_string(),
            compatibility_type: "Unknown".to_string(),
            link: format!("{GALLERY_URL}/{package}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use pretty_assertions::assert_eq;

    fn net10() -> TargetFramework {
        TargetFramework::parse("net10.0")
    }

    fn targets(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn version(v: &str, frameworks: &[&str]) -> VersionInfo {
        VersionInfo {
            version: v.to_string(),
            published: DateTime::<FixedOffset>::parse_from_rfc3339("2024-05-17T10:00:00+00:00").ok(),
            listed: true,
            target_frameworks: targets(frameworks),
        }
    }

    #[test]
    fn test_parse_monikers() {
        assert_eq!(
            TargetFramework::parse("net8.0-android34.0"),
            TargetFramework::Net {
                major: 8,
                minor: 0,
                platform: Some("android34.0".to_string())
            }
        );
        assert_eq!(
            TargetFramework::parse(".NETStandard2.0"),
            TargetFramework::NetStandard { major: 2, minor: 0 }
        );
        assert_eq!(
            TargetFramework::parse(".NETCoreApp3.1"),
            TargetFramework::NetCoreApp { major: 3, minor: 1 }
        );
        assert!(matches!(
            TargetFramework::parse(".NETFramework4.5"),
            TargetFramework::NetFramework(_)
        ));
        assert!(matches!(
            TargetFramework::parse("net472"),
            TargetFramework::NetFramework(_)
        ));
        assert!(matches!(
            TargetFramework::parse("MonoAndroid10"),
            TargetFramework::Other(_)
        ));
    }

    #[test]
    fn test_classify_default_policy() {
        let policy = CompatibilityPolicy::default();
        let target = net10();
        assert_eq!(
            classify(&targets(&["net10.0", "netstandard2.0"]), &target, &policy),
            CompatibilityType::Direct
        );
        assert_eq!(
            classify(&targets(&["net8.0-ios17.0"]), &target, &policy),
            CompatibilityType::ForwardCompatible
        );
        assert_eq!(
            classify(&targets(&[".NETStandard2.1"]), &target, &policy),
            CompatibilityType::NetStandard
        );
        assert_eq!(
            classify(&[], &target, &policy),
            CompatibilityType::NoFrameworkDeclared
        );
        assert_eq!(
            classify(
                &targets(&[".NETFramework4.6.1", "netstandard1.3", "net11.0"]),
                &target,
                &policy
            ),
            CompatibilityType::Incompatible
        );
    }

    #[test]
    fn test_classify_with_policies_disabled() {
        let policy = CompatibilityPolicy {
            allow_forward_compatible: false,
            allow_netstandard: false,
            treat_no_dependency_groups_as_compatible: false,
            ..CompatibilityPolicy::default()
        };
        let target = net10();
        assert_eq!(
            classify(&targets(&["net8.0"]), &target, &policy),
            CompatibilityType::Incompatible
        );
        assert_eq!(
            classify(&targets(&["netstandard2.0"]), &target, &policy),
            CompatibilityType::Incompatible
        );
        assert_eq!(classify(&[], &target, &policy), CompatibilityType::Incompatible);
        assert_eq!(
            classify(&targets(&["net10.0-android"]), &target, &policy),
            CompatibilityType::Direct
        );
    }

    #[test]
    fn test_version_ordering() {
        let mut versions: Vec<PackageVersion> = ["1.0.0", "1.0.0-beta.2", "1.0.0.1", "0.9", "1.0.0-beta.10", "10.0.0"]
            .iter()
            .map(|v| PackageVersion::parse(v).unwrap())
            .collect();
        versions.sort();
        let expected: Vec<PackageVersion> = ["0.9", "1.0.0-beta.2", "1.0.0-beta.10", "1.0.0", "1.0.0.1", "10.0.0"]
            .iter()
            .map(|v| PackageVersion::parse(v).unwrap())
            .collect();
        assert_eq!(versions, expected);
        assert!(PackageVersion::parse("1.2.3.4.5").is_none());
        assert!(PackageVersion::parse("abc").is_none());
    }

    #[test]
    fn test_evaluate_picks_newest_compatible() {
        let metadata = PackageMetadata {
            id: "Sample".to_string(),
            versions: vec![
                version("1.0.0", &["netstandard2.0"]),
                version("3.0.0-preview1", &["net10.0"]),
                version("2.0.0", &["net11.0"]),
                version("1.5.0", &["net8.0"]),
            ],
        };
        let evaluation = evaluate(&metadata, &net10(), &CompatibilityPolicy::default());
        assert_eq!(evaluation.compatibility, CompatibilityType::ForwardCompatible);
        assert_eq!(evaluation.version.unwrap().version, "1.5.0");

        let with_prerelease = CompatibilityPolicy {
            include_prerelease: true,
            ..CompatibilityPolicy::default()
        };
        let evaluation = evaluate(&metadata, &net10(), &with_prerelease);
        assert_eq!(evaluation.compatibility, CompatibilityType::Direct);
        assert_eq!(evaluation.version.unwrap().version, "3.0.0-preview1");
    }

    #[test]
    fn test_evaluate_skips_unlisted() {
        let mut unlisted = version("2.0.0", &["net10.0"]);
        unlisted.listed = false;
        let metadata = PackageMetadata {
            id: "Sample".to_string(),
            versions: vec![unlisted, version("1.0.0", &["net9.0"])],
        };
        let evaluation = evaluate(&metadata, &net10(), &CompatibilityPolicy::default());
        assert_eq!(evaluation.version.unwrap().version, "1.0.0");

        let lenient = CompatibilityPolicy {
            require_listed: false,
            ..CompatibilityPolicy::default()
        };
        let evaluation = evaluate(&metadata, &net10(), &lenient);
        assert_eq!(evaluation.version.unwrap().version, "2.0.0");
    }

    #[test]
    fn test_report_rows() {
        let evaluation = Evaluation {
            version: Some(version("13.0.3", &["net6.0"])),
            compatibility: CompatibilityType::ForwardCompatible,
        };
        assert_eq!(
            PackageReportRow::from_evaluation("Newtonsoft.Json", &evaluation),
            PackageReportRow {
                package: "Newtonsoft.Json".to_string(),
                compatible: "Yes".to_string(),
                version: "13.0.3".to_string(),
                published: "2024-05-17".to_string(),
                compatibility_type: "Forward compatible".to_string(),
                link: "https://www.nuget.org/packages/Newtonsoft.Json/13.0.3".to_string(),
            }
        );

        let failed = PackageReportRow::error("Broken.Package");
        assert_eq!(failed.compatible, "Error");
        assert_eq!(failed.version, "Unknown");
        assert_eq!(failed.published, "Unknown");
        assert_eq!(failed.compatibility_type, "Unknown");
        assert_eq!(failed.link, "https://www.nuget.org/packages/Broken.Package");
    }
}
