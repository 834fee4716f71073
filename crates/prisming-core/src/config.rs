//! Configuration module for Prisming.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::RecordKind;
use crate::repository::ScanStrategy;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Prisming.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ledger: LedgerConfig,
    pub lifecycle: LifecycleConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// Ledger storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Path of the SQLite ledger database.
    pub database: PathBuf,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Seconds a writer waits on a locked database before failing.
    pub busy_timeout_secs: u64,
}

/// Business rule switches for the lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Let enrollment and proposal overwrite an existing record instead of failing.
    pub allow_overwrite: bool,
    /// Require the asset's product type to equal the need's when matching.
    pub match_need_product_type: bool,
}

/// How `read_everything` locates each category of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Use the ledger's kind index.
    #[default]
    KindIndex,
    /// Range-scan keys starting with each category's prefix.
    KeyPrefix,
}

/// Aggregate query settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub scan_mode: ScanMode,
    pub key_prefixes: KeyPrefixes,
}

/// Key prefix of each record category, used by [`ScanMode::KeyPrefix`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPrefixes {
    pub donor: String,
    pub npo: String,
    pub recipient: String,
    pub asset: String,
    pub need: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/prisming/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("prisming")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("prisming")
                .join("ledger.db"),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            scan_mode: ScanMode::KindIndex,
            key_prefixes: KeyPrefixes::default(),
        }
    }
}

impl Default for KeyPrefixes {
    fn default() -> Self {
        Self {
            donor: "d".into(),
            npo: "n".into(),
            recipient: "r".into(),
            asset: "a".into(),
            need: "e".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Upper bound appended to a prefix to close its key range.
const RANGE_END_SUFFIX: &str = "9999999999999999999";

impl KeyPrefixes {
    /// Returns the prefix configured for `kind`.
    pub fn prefix_for(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Donor => &self.donor,
            RecordKind::Npo => &self.npo,
            RecordKind::Recipient => &self.recipient,
            RecordKind::Asset => &self.asset,
            RecordKind::Need => &self.need,
        }
    }
}

impl QueryConfig {
    /// Resolves how records of `kind` are scanned.
    ///
    /// ```
    /// use prisming_core::config::{QueryConfig, ScanMode};
    /// use prisming_core::domain::RecordKind;
    /// use prisming_core::repository::ScanStrategy;
    ///
    /// let mut query = QueryConfig::default();
    /// query.scan_mode = ScanMode::KeyPrefix;
    /// assert_eq!(
    ///     query.scan_strategy(RecordKind::Asset),
    ///     ScanStrategy::KeyRange {
    ///         start: "a0".to_string(),
    ///         end: "a9999999999999999999".to_string(),
    ///     }
    /// );
    /// ```
    pub fn scan_strategy(&self, kind: RecordKind) -> ScanStrategy {
        match self.scan_mode {
            ScanMode::KindIndex => ScanStrategy::KindIndex,
            ScanMode::KeyPrefix => {
                let prefix = self.key_prefixes.prefix_for(kind);
                ScanStrategy::KeyRange {
                    start: format!("{prefix}0"),
                    end: format!("{prefix}{RANGE_END_SUFFIX}"),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"ledger.max_connections"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- ledger ---
        if self.ledger.database.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "ledger.database".into(),
                message: "must not be empty".into(),
            });
        }
        if self.ledger.max_connections == 0 {
            errors.push(ValidationError {
                field: "ledger.max_connections".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.ledger.busy_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "ledger.busy_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- query ---
        if self.query.scan_mode == ScanMode::KeyPrefix {
            let mut seen: Vec<&str> = Vec::new();
            for kind in RecordKind::ALL {
                let prefix = self.query.key_prefixes.prefix_for(kind);
                let field = format!("query.key_prefixes.{}", kind.as_str().to_lowercase());
                if prefix.is_empty() {
                    errors.push(ValidationError {
                        field,
                        message: "must not be empty in key_prefix scan mode".into(),
                    });
                    continue;
                }
                if seen
                    .iter()
                    .any(|other| other.starts_with(prefix) || prefix.starts_with(other))
                {
                    errors.push(ValidationError {
                        field,
                        message: format!("prefix '{prefix}' overlaps another category"),
                    });
                }
                seen.push(prefix);
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError {
                field: "logging.format".into(),
                message: format!(
                    "invalid format '{}'; expected one of: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use prisming_core::config::{ConfigBuilder, ScanMode};
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .ledger_database(PathBuf::from("/tmp/ledger.db"))
///     .match_need_product_type(true)
///     .scan_mode(ScanMode::KeyPrefix)
///     .build();
/// assert!(config.lifecycle.match_need_product_type);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- ledger ---

    pub fn ledger_database(mut self, path: PathBuf) -> Self {
        self.config.ledger.database = path;
        self
    }

    pub fn ledger_max_connections(mut self, n: u32) -> Self {
        self.config.ledger.max_connections = n;
        self
    }

    pub fn ledger_busy_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.ledger.busy_timeout_secs = seconds;
        self
    }

    // --- lifecycle ---

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.config.lifecycle.allow_overwrite = allow;
        self
    }

    pub fn match_need_product_type(mut self, enabled: bool) -> Self {
        self.config.lifecycle.match_need_product_type = enabled;
        self
    }

    // --- query ---

    pub fn scan_mode(mut self, mode: ScanMode) -> Self {
        self.config.query.scan_mode = mode;
        self
    }

    pub fn key_prefixes(mut self, prefixes: KeyPrefixes) -> Self {
        self.config.query.key_prefixes = prefixes;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(cfg.ledger.database.ends_with("prisming/ledger.db"));
        assert_eq!(cfg.ledger.max_connections, 5);
        assert_eq!(cfg.ledger.busy_timeout_secs, 5);
        assert!(!cfg.lifecycle.allow_overwrite);
        assert!(!cfg.lifecycle.match_need_product_type);
        assert_eq!(cfg.query.scan_mode, ScanMode::KindIndex);
        assert_eq!(cfg.query.key_prefixes.asset, "a");
        assert_eq!(cfg.query.key_prefixes.need, "e");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "pretty");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
ledger:
  database: /tmp/test-ledger.db
  max_connections: 2
  busy_timeout_secs: 9
lifecycle:
  allow_overwrite: true
  match_need_product_type: true
query:
  scan_mode: key_prefix
  key_prefixes:
    donor: D
    npo: N
    recipient: R
    asset: A
    need: E
logging:
  level: debug
  format: json
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.ledger.database, PathBuf::from("/tmp/test-ledger.db"));
        assert_eq!(cfg.ledger.max_connections, 2);
        assert_eq!(cfg.ledger.busy_timeout_secs, 9);
        assert!(cfg.lifecycle.allow_overwrite);
        assert!(cfg.lifecycle.match_need_product_type);
        assert_eq!(cfg.query.scan_mode, ScanMode::KeyPrefix);
        assert_eq!(cfg.query.key_prefixes.donor, "D");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"lifecycle:\n  match_need_product_type: true\n")
            .unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert!(cfg.lifecycle.match_need_product_type);
        assert!(!cfg.lifecycle.allow_overwrite);
        assert_eq!(cfg.ledger.max_connections, 5);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"not: [valid: yaml: {{{").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    // -- Validation --

    #[test]
    fn validate_catches_zero_pool_values() {
        let mut cfg = Config::default();
        cfg.ledger.max_connections = 0;
        cfg.ledger.busy_timeout_secs = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "ledger.max_connections"));
        assert!(errors.iter().any(|e| e.field == "ledger.busy_timeout_secs"));
    }

    #[test]
    fn validate_catches_invalid_log_level_and_format() {
        let mut cfg = Config::default();
        cfg.logging.level = "verbose".into();
        cfg.logging.format = "xml".into();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "logging.level"));
        assert!(errors.iter().any(|e| e.field == "logging.format"));
    }

    #[test]
    fn validate_catches_overlapping_prefixes_only_in_prefix_mode() {
        let mut cfg = Config::default();
        cfg.query.key_prefixes.need = "n".into();
        assert!(cfg.validate().is_empty());

        cfg.query.scan_mode = ScanMode::KeyPrefix;
        let errors = cfg.validate();
        assert!(errors
            .iter()
            .any(|e| e.field == "query.key_prefixes.need" && e.message.contains("overlaps")));
    }

    #[test]
    fn validate_catches_empty_prefix() {
        let cfg = ConfigBuilder::new()
            .scan_mode(ScanMode::KeyPrefix)
            .key_prefixes(KeyPrefixes {
                donor: String::new(),
                ..KeyPrefixes::default()
            })
            .build();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "query.key_prefixes.donor"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let mut cfg = Config::default();
            cfg.logging.level = (*level).into();
            assert!(cfg.validate().is_empty(), "level {level} should be valid");
        }
    }

    // -- Query --

    #[test]
    fn kind_index_mode_ignores_prefixes() {
        let query = QueryConfig::default();
        assert_eq!(query.scan_strategy(RecordKind::Donor), ScanStrategy::KindIndex);
    }

    #[test]
    fn key_prefix_mode_builds_ranges() {
        let query = QueryConfig {
            scan_mode: ScanMode::KeyPrefix,
            key_prefixes: KeyPrefixes::default(),
        };
        assert_eq!(
            query.scan_strategy(RecordKind::Need),
            ScanStrategy::KeyRange {
                start: "e0".into(),
                end: "e9999999999999999999".into(),
            }
        );
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        assert_eq!(ConfigBuilder::new().build(), Config::default());
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .ledger_database(PathBuf::from("/tmp/x.db"))
            .ledger_max_connections(1)
            .ledger_busy_timeout_secs(30)
            .allow_overwrite(true)
            .logging_level("warn")
            .logging_format("json")
            .build();
        assert_eq!(cfg.ledger.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.ledger.max_connections, 1);
        assert_eq!(cfg.ledger.busy_timeout_secs, 30);
        assert!(cfg.lifecycle.allow_overwrite);
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, "json");
    }

    #[test]
    fn build_validated_rejects_invalid() {
        let result = ConfigBuilder::new().ledger_max_connections(0).build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "ledger.max_connections");
    }
}
