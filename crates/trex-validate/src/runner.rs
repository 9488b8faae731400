//! Validation runner
//!
//! Feeds extracted triplets to a [`ValidationCollaborator`] in batches.
//! A failing batch is logged and skipped; an exhausted quota ends the run.
//! Whatever was validated before a failure is always returned.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trex_core::{Result, Triplet, TrexError, ValidationCollaborator, ValidationConfig};
use uuid::Uuid;

// ============================================================================
// Report types
// ============================================================================

/// Outcome for one candidate triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected,
    /// The check failed or never ran; not a rejection
    Unvalidated,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Unvalidated => write!(f, "unvalidated"),
        }
    }
}

/// A candidate triplet with its verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedTriplet {
    pub triplet: Triplet,
    pub verdict: Verdict,
}

/// Result of one validation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// One entry per candidate, in input order
    pub results: Vec<ValidatedTriplet>,
    /// Triplets the recall check found that were not candidates
    pub missed: Vec<Triplet>,
    /// Batches that ended unvalidated because of an error
    pub failed_batches: usize,
    /// The run stopped early on an exhausted quota
    pub quota_exhausted: bool,
}

impl ValidationReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            results: Vec::new(),
            missed: Vec::new(),
            failed_batches: 0,
            quota_exhausted: false,
        }
    }

    fn count(&self, verdict: Verdict) -> usize {
        self.results.iter().filter(|r| r.verdict == verdict).count()
    }

    pub fn accepted(&self) -> usize {
        self.count(Verdict::Accepted)
    }

    pub fn rejected(&self) -> usize {
        self.count(Verdict::Rejected)
    }

    pub fn unvalidated(&self) -> usize {
        self.count(Verdict::Unvalidated)
    }

    /// Accepted share of decided triplets (0 when nothing was decided)
    pub fn precision(&self) -> f32 {
        let decided = self.accepted() + self.rejected();
        if decided == 0 {
            0.0
        } else {
            self.accepted() as f32 / decided as f32
        }
    }

    fn mark(&mut self, batch: &[Triplet], verdict: Verdict) {
        self.results.extend(batch.iter().map(|t| ValidatedTriplet {
            triplet: t.clone(),
            verdict,
        }));
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Batching, retrying driver around a validation collaborator
pub struct ValidationRunner {
    collaborator: Arc<dyn ValidationCollaborator>,
    config: ValidationConfig,
}

impl ValidationRunner {
    pub fn new(collaborator: Arc<dyn ValidationCollaborator>, config: ValidationConfig) -> Self {
        Self {
            collaborator,
            config,
        }
    }

    /// Validate `triplets` against `source_text`.
    ///
    /// Never fails: errors degrade individual batches to `Unvalidated`.
    pub async fn run(&self, source_text: &str, triplets: &[Triplet]) -> ValidationReport {
        let mut report = ValidationReport::new();
        let batch_size = self.config.batch_size.max(1);
        let batches: Vec<&[Triplet]> = triplets.chunks(batch_size).collect();

        tracing::info!(
            run_id = %report.run_id,
            triplets = triplets.len(),
            batches = batches.len(),
            "validation run started"
        );

        for (batch_no, batch) in batches.iter().enumerate() {
            if report.quota_exhausted {
                report.mark(batch, Verdict::Unvalidated);
                continue;
            }

            let outcome = self
                .with_retries(|| self.collaborator.check_precision(source_text, batch))
                .await;

            match outcome {
                Ok(decisions) if decisions.len() == batch.len() => {
                    report.results.extend(batch.iter().zip(decisions).map(|(t, ok)| {
                        ValidatedTriplet {
                            triplet: t.clone(),
                            verdict: if ok { Verdict::Accepted } else { Verdict::Rejected },
                        }
                    }));
                }
                Ok(decisions) => {
                    tracing::warn!(
                        batch = batch_no,
                        expected = batch.len(),
                        got = decisions.len(),
                        "decision count mismatch, batch left unvalidated"
                    );
                    report.failed_batches += 1;
                    report.mark(batch, Verdict::Unvalidated);
                }
                Err(TrexError::QuotaExhausted(msg)) => {
                    tracing::warn!(batch = batch_no, "quota exhausted, stopping run: {}", msg);
                    report.quota_exhausted = true;
                    report.failed_batches += 1;
                    report.mark(batch, Verdict::Unvalidated);
                }
                Err(e) => {
                    tracing::warn!(batch = batch_no, "precision check failed, skipping batch: {}", e);
                    report.failed_batches += 1;
                    report.mark(batch, Verdict::Unvalidated);
                }
            }
        }

        if self.config.check_recall && !report.quota_exhausted {
            match self
                .with_retries(|| self.collaborator.check_recall(source_text, triplets))
                .await
            {
                Ok(found) => report.missed = only_missing(found, triplets),
                Err(TrexError::QuotaExhausted(msg)) => {
                    tracing::warn!("quota exhausted during recall check: {}", msg);
                    report.quota_exhausted = true;
                }
                Err(e) => tracing::warn!("recall check failed: {}", e),
            }
        }

        tracing::info!(
            run_id = %report.run_id,
            accepted = report.accepted(),
            rejected = report.rejected(),
            unvalidated = report.unvalidated(),
            missed = report.missed.len(),
            "validation run finished"
        );

        report
    }

    /// Retry transient failures with exponential backoff
    async fn with_retries<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self
                        .config
                        .retry_backoff_ms
                        .saturating_mul(1u64 << attempt.min(16));
                    attempt += 1;
                    tracing::debug!(attempt, delay_ms = delay, "transient failure, retrying: {}", e);
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                other => return other,
            }
        }
    }
}

/// Drop reported triplets that are already candidates, and repeats
fn only_missing(found: Vec<Triplet>, candidates: &[Triplet]) -> Vec<Triplet> {
    let mut seen: HashSet<Triplet> = candidates.iter().cloned().collect();
    found.into_iter().filter(|t| seen.insert(t.clone())).collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Collaborator driven by a queue of precision outcomes
    struct MockCollaborator {
        precision: Mutex<Vec<Result<Vec<bool>>>>,
        recall: Mutex<Option<Result<Vec<Triplet>>>>,
        precision_calls: Mutex<usize>,
    }

    impl MockCollaborator {
        fn new(precision: Vec<Result<Vec<bool>>>, recall: Result<Vec<Triplet>>) -> Arc<Self> {
            Arc::new(Self {
                precision: Mutex::new(precision.into_iter().rev().collect()),
                recall: Mutex::new(Some(recall)),
                precision_calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.precision_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ValidationCollaborator for MockCollaborator {
        async fn check_precision(&self, _: &str, candidates: &[Triplet]) -> Result<Vec<bool>> {
            *self.precision_calls.lock().unwrap() += 1;
            self.precision
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(vec![true; candidates.len()]))
        }

        async fn check_recall(&self, _: &str, _: &[Triplet]) -> Result<Vec<Triplet>> {
            self.recall.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn config(batch_size: usize) -> ValidationConfig {
        ValidationConfig {
            batch_size,
            max_retries: 2,
            retry_backoff_ms: 1,
            check_recall: true,
            max_source_chars: 1000,
        }
    }

    fn triplets(n: usize) -> Vec<Triplet> {
        (0..n)
            .map(|i| Triplet::new(format!("S{i}"), "met", format!("O{i}")))
            .collect()
    }

    #[tokio::test]
    async fn test_all_batches_decided() {
        let mock = MockCollaborator::new(
            vec![Ok(vec![true, false]), Ok(vec![true])],
            Ok(vec![Triplet::new("S9", "met", "O9")]),
        );
        let runner = ValidationRunner::new(mock.clone(), config(2));

        let report = runner.run("text", &triplets(3)).await;
        assert_eq!(report.accepted(), 2);
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.unvalidated(), 0);
        assert_eq!(report.missed, vec![Triplet::new("S9", "met", "O9")]);
        assert!((report.precision() - 2.0 / 3.0).abs() < 0.001);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_is_skipped() {
        let mock = MockCollaborator::new(
            vec![Err(TrexError::LlmError("garbage".into())), Ok(vec![true, true])],
            Ok(Vec::new()),
        );
        let runner = ValidationRunner::new(mock, config(2));

        let report = runner.run("text", &triplets(4)).await;
        assert_eq!(report.failed_batches, 1);
        assert_eq!(report.unvalidated(), 2);
        assert_eq!(report.accepted(), 2);
        // order preserved
        assert_eq!(report.results[0].triplet, Triplet::new("S0", "met", "O0"));
        assert_eq!(report.results[0].verdict, Verdict::Unvalidated);
        assert_eq!(report.results[3].verdict, Verdict::Accepted);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let mock = MockCollaborator::new(
            vec![
                Err(TrexError::Transient("timeout".into())),
                Err(TrexError::Transient("timeout".into())),
                Ok(vec![false]),
            ],
            Ok(Vec::new()),
        );
        let runner = ValidationRunner::new(mock.clone(), config(5));

        let report = runner.run("text", &triplets(1)).await;
        assert_eq!(report.rejected(), 1);
        assert_eq!(report.failed_batches, 0);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mock = MockCollaborator::new(
            vec![
                Err(TrexError::Transient("503".into())),
                Err(TrexError::Transient("503".into())),
                Err(TrexError::Transient("503".into())),
            ],
            Ok(Vec::new()),
        );
        let runner = ValidationRunner::new(mock.clone(), config(5));

        let report = runner.run("text", &triplets(1)).await;
        assert_eq!(report.unvalidated(), 1);
        assert_eq!(report.failed_batches, 1);
        // first attempt + max_retries
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_quota_exhaustion_stops_run() {
        let mock = MockCollaborator::new(
            vec![
                Ok(vec![true]),
                Err(TrexError::QuotaExhausted("insufficient_quota".into())),
            ],
            Ok(vec![Triplet::new("X", "y", "Z")]),
        );
        let runner = ValidationRunner::new(mock.clone(), config(1));

        let report = runner.run("text", &triplets(4)).await;
        assert!(report.quota_exhausted);
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.unvalidated(), 3);
        assert_eq!(report.results.len(), 4);
        // no further calls after the quota error, recall skipped
        assert_eq!(mock.calls(), 2);
        assert!(report.missed.is_empty());
    }

    #[tokio::test]
    async fn test_recall_reports_only_absent_triplets() {
        let candidates = triplets(2);
        let mock = MockCollaborator::new(
            vec![],
            Ok(vec![
                candidates[0].clone(),
                Triplet::new("S0", "met", "O1"),
                Triplet::new("S0", "met", "O1"),
            ]),
        );
        let runner = ValidationRunner::new(mock, config(10));

        let report = runner.run("text", &candidates).await;
        assert_eq!(report.missed, vec![Triplet::new("S0", "met", "O1")]);
    }

    /// LLM that answers every prompt with the same text
    struct FixedClient(&'static str);

    #[async_trait]
    impl trex_core::LlmClient for FixedClient {
        async fn generate(&self, _: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_unreadable_llm_answers_leave_batch_unvalidated() {
        let validator = crate::LlmValidator::new(Arc::new(FixedClient(r#"["unsure", "n/a", true]"#)));
        let runner = ValidationRunner::new(Arc::new(validator), config(3));

        let report = runner.run("text", &triplets(3)).await;
        assert_eq!(report.unvalidated(), 3);
        assert_eq!(report.rejected(), 0);
        assert_eq!(report.failed_batches, 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let mock = MockCollaborator::new(vec![], Ok(Vec::new()));
        let runner = ValidationRunner::new(mock.clone(), config(10));

        let report = runner.run("text", &[]).await;
        assert!(report.results.is_empty());
        assert_eq!(report.precision(), 0.0);
        assert_eq!(mock.calls(), 0);
    }
}
