//! Compiler config loaded from disk

use sep_criteria::{Compiler, CompilerConfig, ConfigError, CriteriaNode, Criterion};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_config_file_and_compile() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("criteria.toml");
    fs::write(
        &path,
        r#"
subject_variable = "doc"
default_prefix = "ptop"

[field_predicates]
title = "dcterms:title"
"#,
    )
    .unwrap();

    let config = CompilerConfig::load(&path).expect("Failed to load config");
    assert_eq!(config.variable_prefix, "v");
    assert_eq!(config.max_depth, 64);

    let tree: CriteriaNode = Criterion::new("title", "equals").with_value("Q3").into();
    let fragment = Compiler::with_config(config).compile(&tree).unwrap();
    assert_eq!(
        fragment,
        "FILTER EXISTS { ?doc dcterms:title ?v0 . FILTER ( LCASE(STR(?v0)) = \"q3\" ) }"
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = CompilerConfig::load(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn test_invalid_setting_in_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("criteria.toml");
    fs::write(&path, "default_prefix = \"not valid\"\n").unwrap();

    assert!(matches!(
        CompilerConfig::load(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = CompilerConfig::default().with_field_predicate("title", "dcterms:title");

    let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize config");
    let parsed = CompilerConfig::from_toml_str(&toml_str).expect("Failed to parse config");
    assert_eq!(parsed, config);
}
