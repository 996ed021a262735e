//! The composite score weight table.
//!
//! A table is validated once, against the configured analyst roster, before
//! any analysis runs. After that, scoring a set of partial reports cannot fail.

use crate::error::ConfigError;
use crate::models::{AnalystKind, PartialReport, ScoreField};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One row of the weight table as configured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Canonical score name in the final report.
    pub score: String,
    /// Report the value is read from.
    pub report: String,
    /// Score field within that report.
    pub field: String,
    /// Fraction of the composite score.
    pub weight: f64,
}

impl WeightEntry {
    pub fn new(score: &str, report: &str, field: &str, weight: f64) -> Self {
        Self {
            score: score.to_string(),
            report: report.to_string(),
            field: field.to_string(),
            weight,
        }
    }
}

/// A validated row, with the declared range of its source field.
#[derive(Debug, Clone)]
pub struct WeightRule {
    pub entry: WeightEntry,
    pub source: AnalystKind,
    pub range: ScoreField,
}

impl WeightRule {
    /// Normalise a raw field value onto 0-100 by the field's upper bound.
    pub fn normalise(&self, raw: f64) -> f64 {
        raw * 100.0 / self.range.max
    }
}

/// Validated weight table.
#[derive(Debug, Clone)]
pub struct WeightTable {
    version: String,
    rules: Vec<WeightRule>,
}

impl WeightTable {
    /// Validate entries against the analysts that will actually run.
    pub fn new(
        version: impl Into<String>,
        entries: Vec<WeightEntry>,
        roster: &[AnalystKind],
    ) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyWeights);
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(entries.len());

        for entry in entries {
            if !entry.weight.is_finite() || !(0.0..=1.0).contains(&entry.weight) {
                return Err(ConfigError::InvalidWeight {
                    score: entry.score,
                    weight: entry.weight,
                });
            }

            if !seen.insert(entry.score.clone()) {
                return Err(ConfigError::DuplicateScore(entry.score));
            }

            let Some(source) = roster
                .iter()
                .copied()
                .find(|kind| kind.report_name() == entry.report)
            else {
                return Err(ConfigError::UnknownReport {
                    score: entry.score,
                    report: entry.report,
                });
            };

            let Some(range) = source.score_field(&entry.field) else {
                return Err(ConfigError::UnknownField {
                    score: entry.score,
                    report: entry.report,
                    field: entry.field,
                });
            };

            rules.push(WeightRule {
                entry,
                source,
                range,
            });
        }

        let sum: f64 = rules.iter().map(|r| r.entry.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum(sum));
        }

        Ok(Self {
            version: version.into(),
            rules,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entries(&self) -> &[WeightRule] {
        &self.rules
    }

    /// Normalised score for every entry. Failed or missing sources count as 0.
    pub fn scores(&self, partials: &BTreeMap<String, PartialReport>) -> BTreeMap<String, f64> {
        self.rules
            .iter()
            .map(|rule| {
                let value = partials
                    .get(&rule.entry.report)
                    .and_then(|p| p.score(&rule.entry.field))
                    .map(|raw| rule.normalise(raw))
                    .unwrap_or(0.0);
                (rule.entry.score.clone(), value)
            })
            .collect()
    }

    /// Weighted composite of normalised scores, rounded and clamped to 0-100.
    pub fn composite(&self, scores: &BTreeMap<String, f64>) -> u8 {
        let total: f64 = self
            .rules
            .iter()
            .map(|rule| rule.entry.weight * scores.get(&rule.entry.score).copied().unwrap_or(0.0))
            .sum();

        if !total.is_finite() {
            return 0;
        }

        total.round().clamp(0.0, 100.0) as u8
    }
}
