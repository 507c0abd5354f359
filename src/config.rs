//! Configuration file schema for gosight.
//!
//! The configuration selects which files are analyzed and how the built-in
//! diagnostic rules behave.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::{rules::BUILTIN_CODES, Severity, DEFAULT_SOURCE};

/// Default config file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["gosight.yaml", ".gosight.yaml"];

/// Configuration written by `gosight init`.
pub const DEFAULT_CONFIG: &str = include_str!("templates/gosight.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// Source tag for diagnostics (default: "go-analyzer")
    #[serde(default)]
    pub source: Option<String>,
    /// Whether to include `_test.go` files in directory analysis (default: false)
    #[serde(default)]
    pub include_test_files: Option<bool>,
    /// Glob patterns for paths to exclude from analysis (e.g., "**/vendor/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Per-rule settings keyed by rule code.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

/// Settings for one diagnostic rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Report findings at this severity instead of the rule's default.
    #[serde(default)]
    pub severity: Option<Severity>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            severity: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, default configuration.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Load the explicit config, else a discovered one, else defaults; then validate.
    pub fn load(explicit: Option<&Path>, search_dir: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::discover(search_dir),
        };
        let config = match &path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading configuration");
                Self::parse_file(p)
                    .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", p.display(), e))?
            }
            None => {
                tracing::debug!("no configuration file found, using defaults");
                Self::default()
            }
        };
        validate(&config)?;
        Ok(config)
    }

    /// Source tag stamped on diagnostics.
    pub fn source_tag(&self) -> &str {
        self.source.as_deref().unwrap_or(DEFAULT_SOURCE)
    }

    /// Returns whether to include test files (defaults to false).
    pub fn should_include_test_files(&self) -> bool {
        self.include_test_files.unwrap_or(false)
    }

    /// Whether a rule runs (rules are enabled unless configured otherwise).
    pub fn rule_enabled(&self, code: &str) -> bool {
        self.rules.get(code).map(|r| r.enabled).unwrap_or(true)
    }

    pub fn severity_override(&self, code: &str) -> Option<Severity> {
        self.rules.get(code).and_then(|r| r.severity)
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|glob| glob.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if let Some(source) = &config.source {
        if source.trim().is_empty() {
            anyhow::bail!("source must not be empty");
        }
    }

    for code in config.rules.keys() {
        if !BUILTIN_CODES.contains(&code.as_str()) {
            anyhow::bail!(
                "unknown rule {:?} (known rules: {})",
                code,
                BUILTIN_CODES.join(", ")
            );
        }
    }

    // Validate excluded_paths glob patterns compile
    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}
