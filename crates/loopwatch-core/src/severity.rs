//! Severity policies for ranking cycles.
//!
//! Every policy obeys the same contract:
//!
//! - non-decreasing in occurrence count and in cycle length,
//! - strictly positive whenever the cycle was realized (count > 0),
//! - exactly zero for unrealized cycles.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SeverityWeighting {
    /// `count * length`.
    #[default]
    FrequencyTimesLength,
    /// `frequency_weight * count + length_weight * length`.
    Weighted {
        frequency_weight: f64,
        length_weight: f64,
    },
    /// `ln(1 + count) * length`. Damps very frequent short loops.
    Logarithmic,
}

impl SeverityWeighting {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, occurrence_count: usize, length: usize) -> f64 {
        if occurrence_count == 0 {
            return 0.0;
        }

        let count = occurrence_count as f64;
        let length = length as f64;

        match *self {
            Self::FrequencyTimesLength => count * length,
            Self::Weighted {
                frequency_weight,
                length_weight,
            } => frequency_weight.mul_add(count, length_weight * length),
            Self::Logarithmic => count.ln_1p() * length,
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] when a weight is negative or non-finite, or
    /// when both weights are zero (which would score realized cycles as 0).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Self::Weighted {
            frequency_weight,
            length_weight,
        } = *self
        else {
            return Ok(());
        };

        for (field, value) in [
            ("frequency_weight", frequency_weight),
            ("length_weight", length_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { field, value });
            }
        }

        if frequency_weight <= 0.0 && length_weight <= 0.0 {
            return Err(ConfigError::AllWeightsZero);
        }

        Ok(())
    }
}
