use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use docmerge_config::{
    Config, ConfigError, ConfigSourceKind, LoadOptions, DEFAULT_PLACEHOLDER_PATTERN,
};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert_eq!(config.placeholder.pattern, DEFAULT_PLACEHOLDER_PATTERN);
    assert_eq!(config.images.default_height, 50.0);
    assert_eq!(config.images.default_width, 50.0);
    assert_eq!(config.storage.root, working_dir.join(".docmerge/store"));
    assert_eq!(config.export.page_width, 612.0);
    assert_eq!(config.export.page_height, 792.0);
    assert_eq!(config.export.font_size, 11.0);

    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_merges_fields() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".docmerge.toml"),
        r#"
        [images]
        default_height = 80.0
        default_width = 90.0

        [storage]
        root = "shared-store"
        "#,
    );

    let nested = git_root.join("service");
    fs::create_dir(&nested).expect("create nested");
    write_file(
        nested.join(".docmerge.toml"),
        r#"
        [images]
        default_width = 120.0

        [export]
        font_size = 9.5
        "#,
    );

    let override_path = nested.join("override.toml");
    write_file(
        &override_path,
        r#"
        [export]
        page_width = 595.0
        page_height = 842.0
        "#,
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(nested.clone())
            .with_override_path(override_path.clone()),
    )
    .expect("load layered config");

    assert_eq!(config.images.default_height, 80.0);
    assert_eq!(config.images.default_width, 120.0);
    assert_eq!(config.storage.root, git_root.join("shared-store"));
    assert_eq!(config.export.font_size, 9.5);
    assert_eq!(config.export.page_width, 595.0);
    assert_eq!(config.export.page_height, 842.0);

    let kinds: Vec<_> = config.sources.layers.iter().map(|layer| layer.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override,
        ]
    );
}

#[test]
fn reports_missing_override() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(working_dir)
            .with_override_path("missing.toml"),
    )
    .expect_err("override should be required");

    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn surfaces_parse_errors_with_path() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(working_dir.join(".docmerge.toml"), "[images\n");

    let err = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect_err("malformed toml");

    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, working_dir.join(".docmerge.toml")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn aggregates_validation_errors() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());
    write_file(
        working_dir.join(".docmerge.toml"),
        r#"
        [placeholder]
        pattern = "("

        [images]
        default_height = 0.0
        default_width = -4.0
        "#,
    );

    let err = Config::load(LoadOptions::default().with_working_dir(working_dir))
        .expect_err("invalid values");

    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error");
    };
    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].contains("placeholder.pattern"));
    assert!(messages[1].contains("images.default_height"));
    assert!(messages[2].contains("images.default_width"));
    assert!(messages[2].contains("local config at"));
}
