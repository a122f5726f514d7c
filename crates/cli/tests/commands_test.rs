//! Integration tests for the CLI commands

use axum::routing::get;
use axum::{Json, Router};
use keyhoist::config::Config;
use keyhoist::{
    add, apply_overrides, captions, extract, format_summary, hoist, load_config, packages, scan,
    CAPTIONS_REPORT, EXTRACTION_REPORT, PACKAGES_REPORT, SCAN_REPORT,
};
use keyhoist_languages::AppendOutcome;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_for(root: &Path, reports: &Path) -> Config {
    let mut config = Config::default().with_root(root);
    config.reports.output_dir = reports.to_path_buf();
    config
}

#[test]
fn test_hoist_writes_sources_container_and_report() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("Page.cs"),
        r#"class Page { string T => NexgenAMCaption.Get("Inspection", "roomTitle"); }"#,
    )
    .unwrap();

    let config = config_for(&root, &reports);
    let report = hoist(&config, false).unwrap();

    assert_eq!(
        fs::read_to_string(root.join("Page.cs")).unwrap(),
        "class Page { string T => FormConstants.ROOM_TITLE; }"
    );
    assert!(root.join("FormConstants.cs").exists());
    assert!(reports.join(EXTRACTION_REPORT).exists());

    let summary = format_summary(&report, false);
    assert!(summary.contains("Unique keys:          1 (1 new)"), "{summary}");
    assert!(summary.contains("Rewrote 1 calls in 1 files"), "{summary}");
}

#[test]
fn test_mode_override_regenerates_container() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("FormConstants.cs"),
        "public static class FormConstants\n{\n\tpublic static string STALE => NexgenAMCaption.Get(\"Inspection\", \"stale\");\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("Page.cs"),
        r#"class Page { string T => NexgenAMCaption.Get("Inspection", "roomTitle"); }"#,
    )
    .unwrap();

    let mut config = config_for(&root, &reports);
    let mode = "overwrite".parse().ok();
    let policy = "error".parse().ok();
    apply_overrides(&mut config, mode, policy);
    let report = hoist(&config, false).unwrap();

    let constants = fs::read_to_string(root.join("FormConstants.cs")).unwrap();
    assert!(!constants.contains("STALE"), "{constants}");
    assert!(constants.contains("ROOM_TITLE"), "{constants}");
    let summary = format_summary(&report, false);
    assert!(summary.contains("Mode:                 overwrite"), "{summary}");
}

#[test]
fn test_dry_run_writes_no_report() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("Page.cs"),
        r#"class Page { string T => NexgenAMCaption.Get("Inspection", "roomTitle"); }"#,
    )
    .unwrap();

    let report = hoist(&config_for(&root, &reports), true).unwrap();
    assert!(format_summary(&report, true).contains("Would rewrite 1 calls"));
    assert!(!reports.exists());
    assert!(!root.join("FormConstants.cs").exists());
}

#[test]
fn test_extract_and_add() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("Page.cs"),
        r#"class Page { string T => NexgenAMCaption.Get("Inspection", "floorLabel"); }"#,
    )
    .unwrap();

    let config = config_for(&root, &reports);
    let report = extract(&config).unwrap();
    assert_eq!(report.mapping.entries()[0].identifier, "FLOOR_LABEL");
    assert!(report.rewrite.is_none());

    assert_eq!(
        add(&config, "Inspection", "newKey").unwrap(),
        AppendOutcome::Created {
            identifier: "NEW_KEY".to_string()
        }
    );
    assert_eq!(
        add(&config, "Inspection", "newKey").unwrap(),
        AppendOutcome::AlreadyPresent {
            identifier: "NEW_KEY".to_string()
        }
    );
}

#[test]
fn test_scan_writes_report() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("Api.cs"), r#"var url = "/api/rooms";"#).unwrap();
    fs::write(root.join("Page.xaml"), r#"<Label Text="Room title" />"#).unwrap();

    let path = scan(&config_for(&root, &reports)).unwrap();
    assert_eq!(path, reports.join(SCAN_REPORT));
    assert!(path.exists());
}

#[test]
fn test_load_config_with_root_override() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("keyhoist.toml");
    fs::write(
        &config_path,
        "[extract]\ncategory = \"Work\"\ncontainer = \"WorkConstants\"\n",
    )
    .unwrap();

    let config = load_config(Some(&config_path), Some(dir.path())).unwrap();
    assert_eq!(config.extract.category, "Work");
    assert_eq!(config.extract.root, dir.path());
    assert_eq!(
        config.extract.constants_path(),
        dir.path().join("FormConstants.cs")
    );
}

#[test]
fn test_load_config_rejects_invalid_container() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("keyhoist.toml");
    fs::write(&config_path, "[extract]\ncontainer = \"Form Constants\"\n").unwrap();
    assert!(load_config(Some(&config_path), None).is_err());
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = Router::new()
        .route(
            "/registration/refit/index.json",
            get(|| async {
                Json(json!({
                    "items": [{
                        "@id": "page",
                        "items": [{
                            "catalogEntry": {
                                "version": "7.0.0",
                                "published": "2023-06-01T00:00:00+00:00",
                                "listed": true,
                                "dependencyGroups": [{ "targetFramework": "net6.0" }]
                            }
                        }]
                    }]
                }))
            }),
        )
        .route(
            "/captions",
            get(|| async {
                Json(json!([
                    { "id": 1, "module": "Inspection", "label": "roomTitle", "caption": "Room", "language": "en" }
                ]))
            }),
        );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

#[tokio::test]
async fn test_packages_and_captions_reports() {
    let base = start_server().await;
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("app");
    let reports = dir.path().join("reports");
    fs::create_dir_all(&root).unwrap();
    fs::write(
        root.join("App.csproj"),
        r#"<Project><ItemGroup><PackageReference Include="Refit" Version="7.0.0" /><PackageReference Include="Gone.Package" Version="1.0.0" /></ItemGroup></Project>"#,
    )
    .unwrap();

    let mut config = config_for(&root, &reports);
    config.registry.base_url = format!("{base}/registration/");
    config.registry.retry_attempts = 1;
    config.captions.endpoint = Some(format!("{base}/captions"));
    config.captions.token = Some("token".to_string());

    let path = packages(&config).await.unwrap();
    assert_eq!(path, reports.join(PACKAGES_REPORT));
    assert!(path.exists());

    let path = captions(&config).await.unwrap();
    assert_eq!(path, reports.join(CAPTIONS_REPORT));
    assert!(path.exists());
}
