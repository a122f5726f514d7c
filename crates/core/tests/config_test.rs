use keyhoist_core::config::{CompatibilityPolicy, Config, ExtractConfig};

#[test]
fn test_extract_config_defaults() {
    let config = ExtractConfig::default();
    assert_eq!(config.receiver, "NexgenAMCaption");
    assert_eq!(config.method, "Get");
    assert_eq!(config.category, "Inspection");
    assert_eq!(config.container, "FormConstants");
    assert_eq!(config.extensions, vec!["cs".to_string()]);
    assert!(config.exclude.iter().any(|p| p == "obj"));
    assert!(!config.respect_gitignore);
    assert!(config.namespace.is_none());
}

#[test]
fn test_compatibility_policy_defaults() {
    let policy = CompatibilityPolicy::default();
    assert!(!policy.include_prerelease);
    assert!(policy.require_listed);
    assert!(policy.allow_forward_compatible);
    assert!(policy.allow_netstandard);
    assert!(policy.treat_no_dependency_groups_as_compatible);
}

#[test]
fn test_config_validation_exclude_patterns() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.extract.exclude.push("[unterminated".to_string());
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Invalid extract.exclude pattern"));
}

#[test]
fn test_config_validation_requires_extensions() {
    let mut config = Config::default();
    config.extract.extensions.clear();
    let result = config.validate();
    assert!(result.is_err());
    assert!(result
        .unwrap_err()
        .to_string()
        .contains("at least one extension"));
}

#[test]
fn test_policy_section_partial_override() {
    let config = Config::from_toml_str(
        r#"
        [registry.policy]
        allow_netstandard = false
        "#,
    )
    .expect("valid TOML");

    assert!(!config.registry.policy.allow_netstandard);
    assert!(config.registry.policy.allow_forward_compatible);
    assert_eq!(config.registry.target_framework, "net10.0");
}
