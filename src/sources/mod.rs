//! External data sources used by the analysts.

pub mod doma;
pub mod sales;
pub mod seranking;

pub use doma::{DomaClient, OnChainSource};
pub use sales::SalesCorpus;
pub use seranking::{SeRankingClient, SeoSource};

#[cfg(test)]
pub mod testing {
    use super::doma::{NameRecord, OnChainSource};
    use super::seranking::{SeoProfile, SeoSource};
    use crate::error::TaskError;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory on-chain source.
    #[derive(Default)]
    pub struct StubOnChain {
        pub record: Option<NameRecord>,
        pub events: Vec<Value>,
        pub fail: bool,
        pub last_limit: AtomicUsize,
    }

    impl StubOnChain {
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn with_record(record: NameRecord) -> Self {
            Self {
                record: Some(record),
                ..Self::default()
            }
        }

        pub fn with_events(events: Vec<Value>) -> Self {
            Self {
                events,
                ..Self::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl OnChainSource for StubOnChain {
        async fn name_record(&self, _domain: &str) -> Result<Option<NameRecord>, TaskError> {
            if self.fail {
                return Err(TaskError::source("doma", "connection refused"));
            }
            Ok(self.record.clone())
        }

        async fn recent_events(&self, limit: usize) -> Result<Vec<Value>, TaskError> {
            self.last_limit.store(limit, Ordering::SeqCst);
            if self.fail {
                return Err(TaskError::source("doma", "connection refused"));
            }
            Ok(self.events.clone())
        }
    }

    /// In-memory SEO source.
    pub struct StubSeo {
        pub profile: Option<SeoProfile>,
    }

    impl StubSeo {
        pub fn unconfigured() -> Self {
            Self { profile: None }
        }
    }

    #[async_trait]
    impl SeoSource for StubSeo {
        async fn profile(&self, _domain: &str) -> Result<Option<SeoProfile>, TaskError> {
            Ok(self.profile.clone())
        }
    }
}
