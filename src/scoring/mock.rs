use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::ScoringError;
use super::types::{CandidateSummary, JobSummary, ScoringVerdict};
use super::ScoringProvider;

#[derive(Debug, Clone)]
/// How [`MockScorer`] answers a call.
pub enum MockBehavior {
    /// Returns this verdict.
    Verdict(ScoringVerdict),
    /// Scores `similarity * 100` and advances everyone.
    EchoSimilarity,
    /// Fails with [`ScoringError::Unavailable`].
    Fail,
    /// Fails with [`ScoringError::MalformedResponse`].
    Malformed,
    /// Never returns.
    Hang,
}

/// Scripted scorer with call and concurrency accounting.
#[derive(Clone)]
pub struct MockScorer {
    default: MockBehavior,
    overrides: Arc<RwLock<HashMap<String, MockBehavior>>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockScorer {
    pub fn new(default: MockBehavior) -> Self {
        Self {
            default,
            overrides: Arc::default(),
            delay: Duration::ZERO,
            calls: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::EchoSimilarity)
    }

    /// Every call waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_behavior(&self, candidate_id: impl Into<String>, behavior: MockBehavior) {
        self.overrides.write().insert(candidate_id.into(), behavior);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn verdict(score: f32, advance: bool) -> ScoringVerdict {
        ScoringVerdict {
            score,
            recommendation: if advance {
                "Recommended".to_string()
            } else {
                "Not Recommended".to_string()
            },
            rationale: format!("mock verdict {}", score),
            advance,
            strengths: vec![],
            concerns: vec![],
        }
    }

    async fn answer(
        &self,
        behavior: MockBehavior,
        similarity: f32,
    ) -> Result<ScoringVerdict, ScoringError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match behavior {
            MockBehavior::Verdict(v) => Ok(v),
            MockBehavior::EchoSimilarity => Ok(Self::verdict(similarity * 100.0, true)),
            MockBehavior::Fail => Err(ScoringError::Unavailable {
                reason: "mock failure".to_string(),
            }),
            MockBehavior::Malformed => Err(ScoringError::MalformedResponse {
                reason: "mock malformed".to_string(),
            }),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScoringProvider for MockScorer {
    async fn score(
        &self,
        candidate: &CandidateSummary,
        _job: &JobSummary,
        similarity: f32,
    ) -> Result<ScoringVerdict, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(self.in_flight.clone());

        let behavior = self
            .overrides
            .read()
            .get(&candidate.candidate_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        self.answer(behavior, similarity).await
    }
}
