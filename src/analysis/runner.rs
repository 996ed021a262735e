//! Concurrent fan-out over the analyst roster.
//!
//! Every analyst is polled at once and the runner waits for all of them to
//! settle. Errors, panics and timeouts are captured per task so that one
//! failing analyst never affects its siblings.

use crate::analysts::Analyst;
use crate::error::TaskError;
use crate::models::{PartialReport, Subject};
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Settle state of one analyst task.
#[derive(Debug)]
pub enum Outcome {
    /// The task completed. `None` means it found no evidence.
    Fulfilled(Option<PartialReport>),
    /// The task errored, panicked or timed out.
    Rejected(TaskError),
}

impl Outcome {
    pub fn is_fulfilled_with_value(&self) -> bool {
        matches!(self, Outcome::Fulfilled(Some(_)))
    }
}

/// Run every analyst concurrently and return outcomes in submission order.
pub async fn run_all(
    subject: &Subject,
    analysts: &[Arc<dyn Analyst>],
    timeout: Option<Duration>,
) -> Vec<Outcome> {
    info!(
        "Launching {} analysts for {} in parallel",
        analysts.len(),
        subject
    );

    let tasks = analysts
        .iter()
        .map(|analyst| run_one(subject, analyst.as_ref(), timeout));

    let outcomes = join_all(tasks).await;

    let fulfilled = outcomes
        .iter()
        .filter(|o| o.is_fulfilled_with_value())
        .count();
    info!(
        "All analysts settled: {} with findings, {} without",
        fulfilled,
        outcomes.len() - fulfilled
    );

    outcomes
}

async fn run_one(subject: &Subject, analyst: &dyn Analyst, timeout: Option<Duration>) -> Outcome {
    let name = analyst.kind().agent_name();
    let started = Instant::now();

    let guarded = AssertUnwindSafe(analyst.analyze(subject)).catch_unwind();

    let settled = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(result) => result,
            Err(_) => Ok(Err(TaskError::Timeout(limit))),
        },
        None => guarded.await,
    };

    let outcome = match settled {
        Ok(Ok(Some(findings))) => Outcome::Fulfilled(Some(PartialReport::success(name, findings))),
        Ok(Ok(None)) => {
            info!("[{}] finished without data", name);
            Outcome::Fulfilled(None)
        }
        Ok(Err(e)) => {
            warn!("[{}] failed: {}", name, e);
            Outcome::Rejected(e)
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("[{}] panicked: {}", name, message);
            Outcome::Rejected(TaskError::Panicked(message))
        }
    };

    debug!(
        "[{}] settled after {:.2}s",
        name,
        started.elapsed().as_secs_f64()
    );

    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysts::testing::StubAnalyst;
    use crate::models::{AnalystKind, Findings};

    fn subject() -> Subject {
        Subject::parse("alpha.test").unwrap()
    }

    #[tokio::test]
    async fn test_preserves_submission_order() {
        let analysts: Vec<Arc<dyn Analyst>> = vec![
            Arc::new(StubAnalyst::scoring(AnalystKind::OnChain, 1.0).delayed(120)),
            Arc::new(StubAnalyst::scoring(AnalystKind::Web2Authority, 2.0).delayed(80)),
            Arc::new(StubAnalyst::scoring(AnalystKind::MarketIntel, 3.0).delayed(40)),
            Arc::new(StubAnalyst::scoring(AnalystKind::LiveMomentum, 4.0).delayed(0)),
        ];

        let outcomes = run_all(&subject(), &analysts, None).await;
        assert_eq!(outcomes.len(), 4);

        let kinds: Vec<AnalystKind> = outcomes
            .iter()
            .map(|o| match o {
                Outcome::Fulfilled(Some(report)) => report.findings().map(Findings::kind).unwrap(),
                other => panic!("unexpected outcome: {:?}", other),
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                AnalystKind::OnChain,
                AnalystKind::Web2Authority,
                AnalystKind::MarketIntel,
                AnalystKind::LiveMomentum,
            ]
        );
    }

    #[tokio::test]
    async fn test_fast_failure_does_not_cancel_slow_sibling() {
        let analysts: Vec<Arc<dyn Analyst>> = vec![
            Arc::new(StubAnalyst::failing(AnalystKind::OnChain, "boom")),
            Arc::new(StubAnalyst::scoring(AnalystKind::MarketIntel, 8.0).delayed(500)),
        ];

        let started = Instant::now();
        let outcomes = run_all(&subject(), &analysts, None).await;

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(matches!(outcomes[0], Outcome::Rejected(TaskError::Source { .. })));
        match &outcomes[1] {
            Outcome::Fulfilled(Some(report)) => {
                assert_eq!(report.score("market_trend_score"), Some(8.0));
            }
            other => panic!("slow sibling was not fulfilled: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_result_is_fulfilled_none() {
        let analysts: Vec<Arc<dyn Analyst>> = vec![Arc::new(StubAnalyst::empty(AnalystKind::Web2Authority))];

        let outcomes = run_all(&subject(), &analysts, None).await;
        assert!(matches!(outcomes[0], Outcome::Fulfilled(None)));
    }

    #[tokio::test]
    async fn test_panic_is_reified() {
        let analysts: Vec<Arc<dyn Analyst>> = vec![
            Arc::new(StubAnalyst::panicking(AnalystKind::OnChain)),
            Arc::new(StubAnalyst::scoring(AnalystKind::MarketIntel, 5.0)),
        ];

        let outcomes = run_all(&subject(), &analysts, None).await;
        match &outcomes[0] {
            Outcome::Rejected(TaskError::Panicked(message)) => {
                assert!(message.contains("stub analyst panicked"));
            }
            other => panic!("expected panic outcome, got {:?}", other),
        }
        assert!(outcomes[1].is_fulfilled_with_value());
    }

    #[tokio::test]
    async fn test_timeout_is_rejected() {
        let analysts: Vec<Arc<dyn Analyst>> = vec![
            Arc::new(StubAnalyst::scoring(AnalystKind::OnChain, 5.0).delayed(2_000)),
            Arc::new(StubAnalyst::scoring(AnalystKind::MarketIntel, 5.0)),
        ];

        let outcomes = run_all(&subject(), &analysts, Some(Duration::from_millis(50))).await;
        assert!(matches!(outcomes[0], Outcome::Rejected(TaskError::Timeout(_))));
        assert!(outcomes[1].is_fulfilled_with_value());
    }

    #[tokio::test]
    async fn test_empty_roster() {
        let outcomes = run_all(&subject(), &[], None).await;
        assert!(outcomes.is_empty());
    }
}
