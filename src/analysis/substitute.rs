//! Replacement of failed or empty outcomes with explicit placeholders.

use super::runner::Outcome;
use crate::models::{FailureCause, PartialReport};

/// Turn an outcome into a partial report. Never fails.
///
/// Empty outcomes get `default_reason`; rejected ones carry the error text.
pub fn substitute(outcome: &Outcome, agent_name: &str, default_reason: &str) -> PartialReport {
    match outcome {
        Outcome::Fulfilled(Some(report)) => report.clone(),
        Outcome::Fulfilled(None) => {
            PartialReport::failure(agent_name, FailureCause::NoData, default_reason)
        }
        Outcome::Rejected(error) => PartialReport::failure(
            agent_name,
            FailureCause::Rejected,
            format!("Agent failed: {}", error),
        ),
    }
}
