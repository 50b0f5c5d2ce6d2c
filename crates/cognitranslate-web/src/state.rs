use anyhow::Result;
use cognitranslate_core::{AppConfig, CogniTranslator, TranslationOutcome, progress_message};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Jobs older than this are dropped by the cleanup sweep.
pub const JOB_MAX_AGE: Duration = Duration::from_secs(3600);

/// A translation request and, once finished, its result
pub struct Job {
    pub source_label: String,
    pub created_at: Instant,
    pub progress: Arc<TranslateJob>,
}

/// Progress tracking shared between the worker task and the SSE stream
pub struct TranslateJob {
    /// Shown until the first chunk is translated
    pub stage: &'static str,
    pub current: AtomicUsize,
    pub total: AtomicUsize,
    pub done: AtomicBool,
    pub error: RwLock<Option<String>>,
    pub outcome: RwLock<Option<Arc<TranslationOutcome>>>,
}

impl TranslateJob {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            current: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            done: AtomicBool::new(false),
            error: RwLock::new(None),
            outcome: RwLock::new(None),
        }
    }

    /// Record that `current` of `total` chunks are translated.
    pub fn set_progress(&self, current: usize, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.current.store(current, Ordering::SeqCst);
    }

    pub fn progress(&self) -> (usize, usize) {
        (
            self.current.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }

    /// Human-readable status line for the progress bar.
    pub fn message(&self) -> String {
        let (current, total) = self.progress();
        progress_message(self.stage, current, total)
    }

    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
    }

    pub async fn finish(&self, outcome: TranslationOutcome) {
        *self.outcome.write().await = Some(Arc::new(outcome));
        self.mark_done();
    }

    pub async fn fail(&self, error: String) {
        *self.error.write().await = Some(error);
        self.mark_done();
    }

    pub async fn get_error(&self) -> Option<String> {
        self.error.read().await.clone()
    }

    pub async fn get_outcome(&self) -> Option<Arc<TranslationOutcome>> {
        self.outcome.read().await.clone()
    }
}

/// Global application state
pub struct AppState {
    /// Jobs indexed by UUID
    jobs: RwLock<HashMap<Uuid, Job>>,
    /// Shared pipeline; its chunk cache outlives individual jobs
    pub translator: Arc<CogniTranslator>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator = CogniTranslator::new(config)
            .map_err(|e| anyhow::anyhow!("Failed to create translator: {e}"))?;
        Ok(Self::with_translator(translator))
    }

    pub fn with_translator(translator: CogniTranslator) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            translator: Arc::new(translator),
        }
    }

    /// Register a new job and return its ID.
    pub async fn create_job(&self, source_label: String, progress: Arc<TranslateJob>) -> Uuid {
        let id = Uuid::new_v4();
        let job = Job {
            source_label,
            created_at: Instant::now(),
            progress,
        };
        self.jobs.write().await.insert(id, job);
        id
    }

    /// Get a job by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or the job doesn't exist.
    pub async fn get_job(&self, id: &str) -> Option<JobRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let jobs = self.jobs.read().await;
        jobs.contains_key(&uuid).then_some(JobRef {
            id: uuid,
            state: self,
        })
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Drop jobs older than `max_age`, returning how many were removed.
    pub async fn cleanup_old_jobs(&self, max_age: Duration) -> usize {
        let mut jobs = self.jobs.write().await;
        let now = Instant::now();
        let before = jobs.len();

        jobs.retain(|_, job| now.duration_since(job.created_at) < max_age);

        before - jobs.len()
    }
}

/// A borrowed reference to a job.
///
/// Locks are taken only inside the synchronous closures, so no guard is
/// ever held across an `.await`.
pub struct JobRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl JobRef<'_> {
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Access job data within a closure while holding a read lock.
    pub async fn with_job<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Job) -> R,
    {
        let jobs = self.state.jobs.read().await;
        jobs.get(&self.id).map(f)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cognitranslate_core::config::CacheConfig;

    fn test_state() -> AppState {
        let config = AppConfig {
            cache: CacheConfig {
                memory_enabled: false,
                disk_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        AppState::new(config).unwrap()
    }

    #[test]
    fn test_progress_message() {
        let job = TranslateJob::new("Processing PDF...");
        assert_eq!(job.message(), "Processing PDF...");

        job.set_progress(0, 3);
        assert_eq!(job.message(), "Translating chunk 1 of 3");

        job.set_progress(2, 3);
        assert_eq!(job.message(), "Translating chunk 3 of 3");

        job.set_progress(3, 3);
        assert_eq!(job.message(), "Translated 3 chunks");

        let single = TranslateJob::new("Processing Website...");
        single.set_progress(0, 1);
        assert_eq!(single.message(), "Translating chunk 1 of 1");
        single.set_progress(1, 1);
        assert_eq!(single.message(), "Translated 1 chunk");
    }

    #[tokio::test]
    async fn test_fail_marks_done() {
        let job = TranslateJob::new("Processing Website...");
        job.fail("Error scraping website: boom".to_string()).await;
        assert!(job.is_done());
        assert_eq!(job.get_error().await.as_deref(), Some("Error scraping website: boom"));
        assert!(job.get_outcome().await.is_none());
    }

    #[tokio::test]
    async fn test_job_lookup() {
        let state = test_state();
        let id = state
            .create_job(
                "paper.pdf".to_string(),
                Arc::new(TranslateJob::new("Processing PDF...")),
            )
            .await;

        let job = state.get_job(&id.to_string()).await.unwrap();
        assert_eq!(job.id(), id);
        let label = job.with_job(|j| j.source_label.clone()).await;
        assert_eq!(label.as_deref(), Some("paper.pdf"));

        assert!(state.get_job("not-a-uuid").await.is_none());
        assert!(state.get_job(&Uuid::new_v4().to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_drops_expired_jobs() {
        let state = test_state();
        state
            .create_job(
                "https://example.com".to_string(),
                Arc::new(TranslateJob::new("Processing Website...")),
            )
            .await;

        assert_eq!(state.cleanup_old_jobs(JOB_MAX_AGE).await, 0);
        assert_eq!(state.job_count().await, 1);

        assert_eq!(state.cleanup_old_jobs(Duration::ZERO).await, 1);
        assert_eq!(state.job_count().await, 0);
    }
}
