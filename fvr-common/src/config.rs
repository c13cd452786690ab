//! Configuration schema, path resolution and loading
//!
//! The config file location is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `FVR_CONFIG` environment variable
//! 3. Per-user config file (`~/.config/fvr/config.toml` on Linux)
//! 4. Compiled defaults (no file at all)
//!
//! A missing file never stops a binary from starting: it logs a warning and
//! falls back to the compiled defaults. A file that exists but does not parse
//! is a configuration error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FVR_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "fvr";

/// Complete TOML configuration
///
/// Every section is optional in the file; absent keys take their compiled default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Input/output file locations
    pub data: DataConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Clustering and scoring settings
    pub pipeline: PipelineSettings,
    /// Membership breakpoint overrides: variable name → term name → points
    ///
    /// Three points describe a triangle, four a trapezoid.
    pub fuzzy: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
    /// Query defaults for consumers
    pub query: QuerySettings,
}

/// Input and output tabular files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// CSV file of raw survey observations
    pub input: PathBuf,
    /// CSV file the result table is exported to
    pub output: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/observations.csv"),
            output: PathBuf::from("data/results.csv"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level directive (trace, debug, info, warn, error)
    ///
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Pipeline settings as written in TOML
///
/// Values are kept as plain strings and numbers here; the engine validates and
/// converts them into typed settings at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of behavioural segments (k)
    pub clusters: usize,
    /// Seed for centroid initialisation
    pub seed: u64,
    /// Independent k-means restarts; the lowest-inertia run wins
    pub restarts: usize,
    /// Iteration cap per restart
    pub max_iterations: usize,
    /// Convergence threshold on total centroid movement
    pub tolerance: f64,
    /// Aggregated features used for clustering
    pub features: Vec<String>,
    /// How defaulted cells enter the per-venue mean: "zero" or "exclude"
    pub missing_values: String,
    /// Cluster naming strategy: "centroid" or "fixed"
    pub cluster_labels: String,
    /// Score assigned when no fuzzy rule fires for a venue
    pub fallback_score: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            clusters: 3,
            seed: 42,
            restarts: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            features: vec![
                "price".to_string(),
                "distance".to_string(),
                "taste".to_string(),
            ],
            missing_values: "zero".to_string(),
            cluster_labels: "centroid".to_string(),
            fallback_score: 0.0,
        }
    }
}

/// Query defaults applied by result table consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Rows returned when a query does not ask for a count
    pub default_limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { default_limit: 3 }
    }
}

impl TomlConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("Config file not found: {}", path.display()))
            } else {
                Error::Config(format!("Read TOML failed ({}): {}", path.display(), e))
            }
        })?;
        Self::from_toml_str(&content)
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given on the command line
    CommandLine(PathBuf),
    /// Path taken from `FVR_CONFIG`
    Environment(PathBuf),
    /// Per-user config file
    UserFile(PathBuf),
    /// Explicit file (CLI or environment) was absent; compiled defaults
    MissingFile(PathBuf),
    /// No file found; compiled defaults
    CompiledDefaults,
}

impl ConfigSource {
    /// File path behind this source, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p) | ConfigSource::Environment(p) | ConfigSource::UserFile(p) => {
                Some(p)
            }
            ConfigSource::MissingFile(_) | ConfigSource::CompiledDefaults => None,
        }
    }

    /// Whether compiled defaults replaced a file the user asked for
    pub fn is_fallback(&self) -> bool {
        matches!(self, ConfigSource::MissingFile(_))
    }

    /// One-line description for the startup log
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::CommandLine(p) => format!("Configuration: {} (command line)", p.display()),
            ConfigSource::Environment(p) => {
                format!("Configuration: {} (from {})", p.display(), CONFIG_ENV_VAR)
            }
            ConfigSource::UserFile(p) => format!("Configuration: {}", p.display()),
            ConfigSource::MissingFile(p) => format!(
                "Config file not found: {} - using compiled defaults",
                p.display()
            ),
            ConfigSource::CompiledDefaults => "Configuration: compiled defaults".to_string(),
        }
    }
}

/// Resolve the config file path following the priority order
///
/// Returns `None` when neither an explicit path nor a per-user file exists.
/// Explicit paths (CLI or environment) are returned even if the file is missing,
/// so the caller can report which path was tried.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<ConfigSource> {
    if let Some(path) = cli_arg {
        return Some(ConfigSource::CommandLine(path.to_path_buf()));
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(ConfigSource::Environment(PathBuf::from(path)));
        }
    }

    default_config_path()
        .filter(|path| path.exists())
        .map(ConfigSource::UserFile)
}

/// Per-user config file location for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load configuration with graceful degradation
///
/// Missing files fall back to defaults with a warning; malformed files fail.
/// Callers that load before installing a subscriber should log
/// [`ConfigSource::describe`] once tracing is up.
pub fn load_config(cli_arg: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    let source = match resolve_config_path(cli_arg) {
        Some(source) => source,
        None => return Ok((TomlConfig::default(), ConfigSource::CompiledDefaults)),
    };

    let path = match source.path() {
        Some(path) => path.to_path_buf(),
        None => return Ok((TomlConfig::default(), source)),
    };

    match TomlConfig::from_file(&path) {
        Ok(config) => {
            info!("Loaded configuration from {}", path.display());
            Ok((config, source))
        }
        Err(Error::NotFound(msg)) => {
            warn!("{} - using compiled defaults", msg);
            Ok((TomlConfig::default(), ConfigSource::MissingFile(path)))
        }
        Err(e) => Err(e),
    }
}

/// Write configuration to a TOML file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_out_empty_file() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.pipeline.clusters, 3);
        assert_eq!(config.pipeline.seed, 42);
        assert_eq!(config.query.default_limit, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            [pipeline]
            clusters = 4
            missing_values = "exclude"
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.clusters, 4);
        assert_eq!(config.pipeline.missing_values, "exclude");
        assert_eq!(config.pipeline.restarts, 10);
        assert_eq!(config.pipeline.features, vec!["price", "distance", "taste"]);
    }

    #[test]
    fn test_fuzzy_overrides_parse() {
        let config = TomlConfig::from_toml_str(
            r#"
            [fuzzy.price]
            cheap = [0.0, 0.0, 10000.0, 14000.0]
            medium = [10000.0, 17000.0, 24000.0]
            "#,
        )
        .unwrap();
        let price = &config.fuzzy["price"];
        assert_eq!(price["cheap"].len(), 4);
        assert_eq!(price["medium"].len(), 3);
    }

    #[test]
    fn test_missing_file_source_is_a_reported_fallback() {
        let source = ConfigSource::MissingFile(PathBuf::from("/etc/fvr/absent.toml"));
        assert!(source.is_fallback());
        assert_eq!(source.path(), None);
        assert_eq!(
            source.describe(),
            "Config file not found: /etc/fvr/absent.toml - using compiled defaults"
        );

        assert!(!ConfigSource::CompiledDefaults.is_fallback());
        assert!(!ConfigSource::UserFile(PathBuf::from("a.toml")).is_fallback());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[pipeline\nclusters = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
