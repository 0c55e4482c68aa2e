//! JSON configuration file
//!
//! ```json
//! {
//!   "rules":   { "leetspeak": { "enabled": true, "priority": 10 } },
//!   "cleanup": { "enabled": true, "filters": { "max_length": { "max_length": 14 } } },
//!   "output":  { "warn_count": 1000000, "warn_disk": "1GB", "max_count": 10000000, "max_disk": "5GB" }
//! }
//! ```
//!
//! Every section is optional. A missing file means built-in defaults;
//! malformed entries are logged and skipped individually.

use crate::error::{PwgenError, Result};
use crate::estimator::FeasibilityLimits;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PwgenConfig {
    /// Raw per-rule entries, validated one by one in [`PwgenConfig::rule_overrides`]
    pub rules: BTreeMap<String, Value>,
    pub cleanup: CleanupConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub enabled: bool,
    /// Per-filter `enabled` flag plus filter-specific parameters
    pub filters: BTreeMap<String, Value>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            filters: BTreeMap::new(),
        }
    }
}

/// Feasibility thresholds as written in the file; resolved by [`OutputConfig::limits`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub warn_count: Option<Value>,
    pub warn_disk: Option<Value>,
    pub max_count: Option<Value>,
    pub max_disk: Option<Value>,
}

/// Validated per-rule override. Unset fields keep the registry's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOverride {
    pub enabled: Option<bool>,
    pub priority: Option<u8>,
}

#[derive(Deserialize)]
struct RawRuleOverride {
    enabled: Option<bool>,
    priority: Option<i64>,
}

impl RuleOverride {
    /// Validate one `rules.<name>` entry
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let raw: RawRuleOverride = serde_json::from_value(value.clone())
            .map_err(|e| PwgenError::config(format!("rules.{name}"), e.to_string()))?;

        let priority = match raw.priority {
            Some(p) if (0..=crate::rules::MAX_PRIORITY as i64).contains(&p) => Some(p as u8),
            Some(p) => {
                return Err(PwgenError::config(
                    format!("rules.{name}.priority"),
                    format!("{p} is outside 0-{}", crate::rules::MAX_PRIORITY),
                ))
            }
            None => None,
        };

        Ok(Self {
            enabled: raw.enabled,
            priority,
        })
    }
}

impl PwgenConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PwgenError::config("config", e.to_string()))
    }

    /// Valid rule overrides; malformed entries are logged and dropped
    pub fn rule_overrides(&self) -> BTreeMap<String, RuleOverride> {
        self.rules
            .iter()
            .filter_map(|(name, value)| match RuleOverride::from_value(name, value) {
                Ok(over) => Some((name.clone(), over)),
                Err(e) => {
                    log::warn!("{}; entry ignored", e);
                    None
                }
            })
            .collect()
    }
}

/// Load the config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<PwgenConfig> {
    if !path.exists() {
        log::debug!("No config file at {:?}, using defaults", path);
        return Ok(PwgenConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| PwgenError::config(path.display().to_string(), e.to_string()))?;
    let config = PwgenConfig::from_json(&content)?;
    log::info!("Loaded configuration from {:?}", path);
    Ok(config)
}

impl OutputConfig {
    /// Resolve thresholds, falling back to the default for any invalid value
    pub fn limits(&self) -> FeasibilityLimits {
        let defaults = FeasibilityLimits::default();
        FeasibilityLimits {
            warn_count: resolve(&self.warn_count, "output.warn_count", parse_count, defaults.warn_count),
            warn_disk: resolve(&self.warn_disk, "output.warn_disk", parse_disk, defaults.warn_disk),
            max_count: resolve(&self.max_count, "output.max_count", parse_count, defaults.max_count),
            max_disk: resolve(&self.max_disk, "output.max_disk", parse_disk, defaults.max_disk),
        }
    }
}

fn resolve(value: &Option<Value>, item: &str, parse: fn(&Value) -> Result<u64>, default: u64) -> u64 {
    let Some(value) = value else {
        return default;
    };
    match parse(value) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("Invalid value for '{}' ({}); using default {}", item, e, default);
            default
        }
    }
}

fn parse_count(value: &Value) -> Result<u64> {
    value
        .as_u64()
        .ok_or_else(|| PwgenError::config("count", format!("expected a non-negative integer, got {value}")))
}

fn parse_disk(value: &Value) -> Result<u64> {
    match value {
        Value::String(s) => parse_size(s),
        other => parse_count(other),
    }
}

/// Parse human-readable size string to bytes (`512MB`, `1GB`, `100`)
pub fn parse_size(size_str: &str) -> Result<u64> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = size_str.strip_suffix("TB") {
        (n, 1u64 << 40)
    } else if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1 << 30)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1 << 20)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1 << 10)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| PwgenError::config("size", format!("invalid size format: '{size_str}'")))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| PwgenError::config("size", format!("size overflows: '{size_str}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("64MB").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("8GB").unwrap(), 8 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("1024KB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size(" 5gb ").unwrap(), 5 << 30);
        assert_eq!(parse_size("100").unwrap(), 100);
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("absent.json")).unwrap();
        assert!(config.rules.is_empty());
        assert!(config.cleanup.enabled);
        assert_eq!(config.output.limits(), FeasibilityLimits::default());
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "rules": {{ "leetspeak": {{ "enabled": false, "priority": 3 }} }},
                "cleanup": {{ "enabled": false, "filters": {{ "min_length": {{ "min_length": 6 }} }} }},
                "output": {{ "warn_count": 500, "warn_disk": "1MB", "max_count": 1000, "max_disk": 4096 }}
            }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        let overrides = config.rule_overrides();
        assert_eq!(
            overrides["leetspeak"],
            RuleOverride {
                enabled: Some(false),
                priority: Some(3)
            }
        );
        assert!(!config.cleanup.enabled);
        assert!(config.cleanup.filters.contains_key("min_length"));

        let limits = config.output.limits();
        assert_eq!(limits.warn_count, 500);
        assert_eq!(limits.warn_disk, 1 << 20);
        assert_eq!(limits.max_count, 1000);
        assert_eq!(limits.max_disk, 4096);
    }

    #[test]
    fn test_malformed_rule_entries_are_skipped() {
        let config = PwgenConfig::from_json(
            r#"{ "rules": {
                "leetspeak": { "priority": 250 },
                "case_variation": { "enabled": "yes" },
                "numeric_suffix": { "enabled": true }
            } }"#,
        )
        .unwrap();

        let overrides = config.rule_overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["numeric_suffix"].enabled, Some(true));
        assert_eq!(overrides["numeric_suffix"].priority, None);
    }

    #[test]
    fn test_invalid_limits_fall_back() {
        let config = PwgenConfig::from_json(
            r#"{ "output": { "warn_count": -5, "max_disk": "huge" } }"#,
        )
        .unwrap();
        assert_eq!(config.output.limits(), FeasibilityLimits::default());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            PwgenConfig::from_json("{ not json"),
            Err(PwgenError::Config { .. })
        ));
    }
}
