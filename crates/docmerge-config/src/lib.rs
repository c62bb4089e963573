//! Configuration primitives and loader for the docmerge toolkit.
//!
//! The loader resolves configuration using a fixed precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Parsed settings are normalised into typed structures so downstream crates
//! can operate without touching raw TOML.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".docmerge.toml";

/// Marker pattern recognised by structure discovery.
pub const DEFAULT_PLACEHOLDER_PATTERN: &str = r"\{(|/)v8 (.+?)\}";
pub const DEFAULT_IMAGE_HEIGHT: f64 = 50.0;
pub const DEFAULT_IMAGE_WIDTH: f64 = 50.0;
pub const DEFAULT_STORAGE_ROOT: &str = ".docmerge/store";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub placeholder: PlaceholderSettings,
    pub images: ImageSettings,
    pub storage: StorageSettings,
    pub export: ExportSettings,
    pub sources: ConfigSources,
}

/// Settings for placeholder discovery.
#[derive(Clone, Debug)]
pub struct PlaceholderSettings {
    pub pattern: String,
}

/// Default bounding box applied to image rules that omit one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSettings {
    pub default_height: f64,
    pub default_width: f64,
}

/// Location of the filesystem document store.
#[derive(Clone, Debug)]
pub struct StorageSettings {
    pub root: PathBuf,
}

/// Page geometry and typography for PDF export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportSettings {
    pub page_width: f64,
    pub page_height: f64,
    pub font_size: f64,
    pub line_spacing: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            page_width: 612.0,
            page_height: 792.0,
            font_size: 11.0,
            line_spacing: 1.2,
        }
    }
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            placeholder: config.placeholder,
            images: config.images,
            storage: config.storage,
            export: config.export,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Builds the built-in defaults anchored at `base_dir` without touching disk.
    pub fn defaults_at(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Config {
            placeholder: PlaceholderSettings {
                pattern: DEFAULT_PLACEHOLDER_PATTERN.to_string(),
            },
            images: ImageSettings {
                default_height: DEFAULT_IMAGE_HEIGHT,
                default_width: DEFAULT_IMAGE_WIDTH,
            },
            storage: StorageSettings {
                root: base_dir.join(DEFAULT_STORAGE_ROOT),
            },
            export: ExportSettings::default(),
            sources: ConfigSources {
                working_directory: base_dir.clone(),
                layers: vec![ConfigSource::default(base_dir)],
            },
        }
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    parse_layer(&contents, source).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })
}

fn parse_layer(contents: &str, source: ConfigSource) -> Result<PartialConfig, toml::de::Error> {
    let raw: RawConfig = toml::from_str(contents)?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let defaults = ExportSettings::default();
    PartialConfig {
        placeholder: Some(PlaceholderPartial {
            pattern: Some(Located::new(
                DEFAULT_PLACEHOLDER_PATTERN.to_string(),
                source.clone(),
            )),
        }),
        images: Some(ImagesPartial {
            default_height: Some(Located::new(DEFAULT_IMAGE_HEIGHT, source.clone())),
            default_width: Some(Located::new(DEFAULT_IMAGE_WIDTH, source.clone())),
        }),
        storage: Some(StoragePartial {
            root: Some(Located::new(
                PathBuf::from(DEFAULT_STORAGE_ROOT),
                source.clone(),
            )),
        }),
        export: Some(ExportPartial {
            page_width: Some(Located::new(defaults.page_width, source.clone())),
            page_height: Some(Located::new(defaults.page_height, source.clone())),
            font_size: Some(Located::new(defaults.font_size, source.clone())),
            line_spacing: Some(Located::new(defaults.line_spacing, source)),
        }),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    placeholder: Option<PlaceholderPartial>,
    images: Option<ImagesPartial>,
    storage: Option<StoragePartial>,
    export: Option<ExportPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_placeholder) = other.placeholder.take() {
            match &mut self.placeholder {
                Some(placeholder) => placeholder.merge(other_placeholder),
                None => self.placeholder = Some(other_placeholder),
            }
        }

        if let Some(other_images) = other.images.take() {
            match &mut self.images {
                Some(images) => images.merge(other_images),
                None => self.images = Some(other_images),
            }
        }

        if let Some(other_storage) = other.storage.take() {
            match &mut self.storage {
                Some(storage) => storage.merge(other_storage),
                None => self.storage = Some(other_storage),
            }
        }

        if let Some(other_export) = other.export.take() {
            match &mut self.export {
                Some(export) => export.merge(other_export),
                None => self.export = Some(other_export),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();
        let fallback = || ConfigSource::default(PathBuf::from("."));

        let placeholder_partial = self.placeholder.unwrap_or_default();
        let pattern = placeholder_partial.pattern.unwrap_or_else(|| {
            Located::new(DEFAULT_PLACEHOLDER_PATTERN.to_string(), fallback())
        });
        if pattern.value.is_empty() {
            errors.push(ConfigValidationError::new(
                Some(pattern.source.clone()),
                "placeholder.pattern cannot be empty".into(),
            ));
        } else if let Err(err) = Regex::new(&pattern.value) {
            errors.push(ConfigValidationError::new(
                Some(pattern.source.clone()),
                format!("placeholder.pattern '{}' is not a valid regex: {err}", pattern.value),
            ));
        }

        let images_partial = self.images.unwrap_or_default();
        let default_height = images_partial
            .default_height
            .unwrap_or_else(|| Located::new(DEFAULT_IMAGE_HEIGHT, fallback()));
        let default_width = images_partial
            .default_width
            .unwrap_or_else(|| Located::new(DEFAULT_IMAGE_WIDTH, fallback()));
        require_positive(&default_height, "images.default_height", &mut errors);
        require_positive(&default_width, "images.default_width", &mut errors);

        let storage_partial = self.storage.unwrap_or_default();
        let root_loc = storage_partial
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from(DEFAULT_STORAGE_ROOT), fallback()));
        if root_loc.value.as_os_str().is_empty() {
            errors.push(ConfigValidationError::new(
                Some(root_loc.source.clone()),
                "storage.root cannot be empty".into(),
            ));
        }
        let storage_root = resolve_path(&root_loc);

        let defaults = ExportSettings::default();
        let export_partial = self.export.unwrap_or_default();
        let page_width = export_partial
            .page_width
            .unwrap_or_else(|| Located::new(defaults.page_width, fallback()));
        let page_height = export_partial
            .page_height
            .unwrap_or_else(|| Located::new(defaults.page_height, fallback()));
        let font_size = export_partial
            .font_size
            .unwrap_or_else(|| Located::new(defaults.font_size, fallback()));
        let line_spacing = export_partial
            .line_spacing
            .unwrap_or_else(|| Located::new(defaults.line_spacing, fallback()));
        require_positive(&page_width, "export.page_width", &mut errors);
        require_positive(&page_height, "export.page_height", &mut errors);
        require_positive(&font_size, "export.font_size", &mut errors);
        require_positive(&line_spacing, "export.line_spacing", &mut errors);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            placeholder: PlaceholderSettings {
                pattern: pattern.value,
            },
            images: ImageSettings {
                default_height: default_height.value,
                default_width: default_width.value,
            },
            storage: StorageSettings { root: storage_root },
            export: ExportSettings {
                page_width: page_width.value,
                page_height: page_height.value,
                font_size: font_size.value,
                line_spacing: line_spacing.value,
            },
        })
    }
}

fn require_positive(value: &Located<f64>, key: &str, errors: &mut Vec<ConfigValidationError>) {
    if !(value.value.is_finite() && value.value > 0.0) {
        errors.push(ConfigValidationError::new(
            Some(value.source.clone()),
            format!("{key} must be a positive number (received {})", value.value),
        ));
    }
}

#[derive(Clone, Debug, Default)]
struct PlaceholderPartial {
    pattern: Option<Located<String>>,
}

impl PlaceholderPartial {
    fn merge(&mut self, other: PlaceholderPartial) {
        if other.pattern.is_some() {
            self.pattern = other.pattern;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ImagesPartial {
    default_height: Option<Located<f64>>,
    default_width: Option<Located<f64>>,
}

impl ImagesPartial {
    fn merge(&mut self, other: ImagesPartial) {
        if other.default_height.is_some() {
            self.default_height = other.default_height;
        }
        if other.default_width.is_some() {
            self.default_width = other.default_width;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct StoragePartial {
    root: Option<Located<PathBuf>>,
}

impl StoragePartial {
    fn merge(&mut self, other: StoragePartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ExportPartial {
    page_width: Option<Located<f64>>,
    page_height: Option<Located<f64>>,
    font_size: Option<Located<f64>>,
    line_spacing: Option<Located<f64>>,
}

impl ExportPartial {
    fn merge(&mut self, other: ExportPartial) {
        if other.page_width.is_some() {
            self.page_width = other.page_width;
        }
        if other.page_height.is_some() {
            self.page_height = other.page_height;
        }
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.line_spacing.is_some() {
            self.line_spacing = other.line_spacing;
        }
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    placeholder: Option<RawPlaceholder>,
    #[serde(default)]
    images: Option<RawImages>,
    #[serde(default)]
    storage: Option<RawStorage>,
    #[serde(default)]
    export: Option<RawExport>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            placeholder: self.placeholder.map(|raw| PlaceholderPartial {
                pattern: raw.pattern.map(|value| Located::new(value, source.clone())),
            }),
            images: self.images.map(|raw| ImagesPartial {
                default_height: raw
                    .default_height
                    .map(|value| Located::new(value, source.clone())),
                default_width: raw
                    .default_width
                    .map(|value| Located::new(value, source.clone())),
            }),
            storage: self.storage.map(|raw| StoragePartial {
                root: raw.root.map(|value| Located::new(value, source.clone())),
            }),
            export: self.export.map(|raw| ExportPartial {
                page_width: raw.page_width.map(|value| Located::new(value, source.clone())),
                page_height: raw
                    .page_height
                    .map(|value| Located::new(value, source.clone())),
                font_size: raw.font_size.map(|value| Located::new(value, source.clone())),
                line_spacing: raw
                    .line_spacing
                    .map(|value| Located::new(value, source.clone())),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlaceholder {
    #[serde(default)]
    pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawImages {
    #[serde(default)]
    default_height: Option<f64>,
    #[serde(default)]
    default_width: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStorage {
    #[serde(default)]
    root: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExport {
    #[serde(default)]
    page_width: Option<f64>,
    #[serde(default)]
    page_height: Option<f64>,
    #[serde(default)]
    font_size: Option<f64>,
    #[serde(default)]
    line_spacing: Option<f64>,
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    placeholder: PlaceholderSettings,
    images: ImageSettings,
    storage: StorageSettings,
    export: ExportSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_overrides_only_present_fields() {
        let base = ConfigSource::default(PathBuf::from("/base"));
        let mut merged = defaults_layer(base);
        let layer = parse_layer(
            "[images]\ndefault_width = 120.0\n",
            ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from("/work/.docmerge.toml")),
        )
        .unwrap();
        merged.merge(layer);

        let resolved = merged.finalize().unwrap();
        assert_eq!(resolved.images.default_width, 120.0);
        assert_eq!(resolved.images.default_height, DEFAULT_IMAGE_HEIGHT);
        assert_eq!(resolved.storage.root, PathBuf::from("/base").join(DEFAULT_STORAGE_ROOT));
    }

    #[test]
    fn rejects_unknown_sections() {
        let source = ConfigSource::default(PathBuf::from("."));
        assert!(parse_layer("[lint]\nrules = []\n", source).is_err());
    }

    #[test]
    fn defaults_at_matches_loaded_defaults() {
        let config = Config::defaults_at("/tmp/project");
        assert_eq!(config.placeholder.pattern, DEFAULT_PLACEHOLDER_PATTERN);
        assert_eq!(config.images.default_height, 50.0);
        assert_eq!(
            config.storage.root,
            PathBuf::from("/tmp/project/.docmerge/store")
        );
    }
}
