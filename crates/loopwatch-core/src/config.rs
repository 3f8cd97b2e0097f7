//! Analysis configuration.
//!
//! Every field is optional; a missing or partial TOML document falls back to
//! the documented defaults field by field:
//!
//! ```toml
//! max_cycles_explored = 10000
//! max_search_steps = 5000000
//! run_gap_minutes = 10
//!
//! [severity]
//! policy = "weighted"
//! frequency_weight = 1.0
//! length_weight = 0.5
//! ```

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::severity::SeverityWeighting;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Upper bound on distinct cycles the enumerator may discover.
    #[serde(default = "default_max_cycles_explored")]
    pub max_cycles_explored: usize,
    /// Upper bound on edge examinations during enumeration.
    #[serde(default = "default_max_search_steps")]
    pub max_search_steps: u64,
    #[serde(default)]
    pub severity: SeverityWeighting,
    /// Gap between consecutive samples that starts a new production run.
    #[serde(default = "default_run_gap_minutes")]
    pub run_gap_minutes: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_cycles_explored: default_max_cycles_explored(),
            max_search_steps: default_max_search_steps(),
            severity: SeverityWeighting::default(),
            run_gap_minutes: default_run_gap_minutes(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML for this schema or
    /// if [`AnalysisConfig::validate`] rejects the values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = toml::from_str::<Self>(content).context("Failed to parse analysis config")?;
        config.validate().context("Invalid analysis config")?;
        Ok(config)
    }

    /// Load the configuration at `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Check bounds and severity weights.
    ///
    /// # Errors
    ///
    /// Returns the first offending value as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cycles_explored == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_cycles_explored",
            });
        }
        if self.max_search_steps == 0 {
            return Err(ConfigError::ZeroBound {
                field: "max_search_steps",
            });
        }
        if self.run_gap_minutes == 0 {
            return Err(ConfigError::ZeroBound {
                field: "run_gap_minutes",
            });
        }
        self.severity.validate()
    }

    #[must_use]
    pub const fn search_limits(&self) -> SearchLimits {
        SearchLimits {
            max_cycles: self.max_cycles_explored,
            max_steps: self.max_search_steps,
        }
    }

    #[must_use]
    pub fn run_gap(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.run_gap_minutes))
    }
}

/// Bounds honored by the cycle enumerator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_cycles: usize,
    pub max_steps: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        AnalysisConfig::default().search_limits()
    }
}

/// The bound that stopped an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "bound", content = "max", rename_all = "snake_case")]
pub enum SearchBound {
    Cycles(usize),
    Steps(u64),
}

impl fmt::Display for SearchBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycles(max) => write!(f, "max_cycles_explored={max}"),
            Self::Steps(max) => write!(f, "max_search_steps={max}"),
        }
    }
}

const fn default_max_cycles_explored() -> usize {
    10_000
}

const fn default_max_search_steps() -> u64 {
    5_000_000
}

const fn default_run_gap_minutes() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AnalysisConfig::from_toml_str("").expect("parse");
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.max_cycles_explored, 10_000);
        assert_eq!(config.max_search_steps, 5_000_000);
        assert_eq!(config.run_gap_minutes, 10);
        assert_eq!(config.severity, SeverityWeighting::FrequencyTimesLength);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = AnalysisConfig::from_toml_str("max_cycles_explored = 25").expect("parse");
        assert_eq!(config.max_cycles_explored, 25);
        assert_eq!(config.max_search_steps, 5_000_000);
    }

    #[test]
    fn weighted_policy_parses_from_table() {
        let config = AnalysisConfig::from_toml_str(
            "[severity]\npolicy = \"weighted\"\nfrequency_weight = 2.0\nlength_weight = 0.5\n",
        )
        .expect("parse");
        assert_eq!(
            config.severity,
            SeverityWeighting::Weighted {
                frequency_weight: 2.0,
                length_weight: 0.5,
            }
        );
    }

    #[test]
    fn logarithmic_policy_parses_without_fields() {
        let config =
            AnalysisConfig::from_toml_str("[severity]\npolicy = \"logarithmic\"\n").expect("parse");
        assert_eq!(config.severity, SeverityWeighting::Logarithmic);
    }

    #[test]
    fn zero_bounds_are_rejected() {
        let err = AnalysisConfig::from_toml_str("max_search_steps = 0").expect_err("must fail");
        let root = err
            .downcast_ref::<ConfigError>()
            .expect("config error in chain");
        assert_eq!(
            root,
            &ConfigError::ZeroBound {
                field: "max_search_steps"
            }
        );
    }

    #[test]
    fn unknown_policy_is_a_parse_error() {
        assert!(AnalysisConfig::from_toml_str("[severity]\npolicy = \"cubic\"\n").is_err());
    }

    #[test]
    fn search_limits_mirror_config() {
        let config = AnalysisConfig {
            max_cycles_explored: 3,
            max_search_steps: 99,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            config.search_limits(),
            SearchLimits {
                max_cycles: 3,
                max_steps: 99
            }
        );
        assert_eq!(config.run_gap(), TimeDelta::minutes(10));
    }

    #[test]
    fn search_bound_display_names_the_setting() {
        assert_eq!(SearchBound::Steps(7).to_string(), "max_search_steps=7");
        assert_eq!(SearchBound::Cycles(3).to_string(), "max_cycles_explored=3");
    }
}
