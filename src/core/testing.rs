//! Scripted backend used by unit tests

use super::backend::{
    ArtworkCandidate, BackendAdapter, BackendDescriptor, BackendError, CostModel,
    RecognitionResult, SharedBackend,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

pub(crate) struct MockBackend {
    descriptor: BackendDescriptor,
    healthy: AtomicBool,
    health_calls: AtomicU32,
    recognize_calls: AtomicU32,
    probe_delay: Mutex<Duration>,
    latency: Mutex<Duration>,
    script: Mutex<VecDeque<Result<RecognitionResult, BackendError>>>,
}

impl MockBackend {
    pub(crate) fn new(name: &str, provider: &str, cost: f64, accuracy: f64, time: f64) -> Self {
        Self {
            descriptor: BackendDescriptor::new(name, provider)
                .with_cost(CostModel::per_call(cost))
                .with_accuracy(accuracy)
                .with_avg_response_time(time),
            healthy: AtomicBool::new(true),
            health_calls: AtomicU32::new(0),
            recognize_calls: AtomicU32::new(0),
            probe_delay: Mutex::new(Duration::ZERO),
            latency: Mutex::new(Duration::ZERO),
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub(crate) fn set_probe_delay(&self, delay: Duration) {
        *self.probe_delay.lock() = delay;
    }

    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Queue outcomes for the next recognize calls; once drained, calls succeed
    pub(crate) fn push_outcome(&self, outcome: Result<RecognitionResult, BackendError>) {
        self.script.lock().push_back(outcome);
    }

    pub(crate) fn fail_times(&self, times: usize) {
        for _ in 0..times {
            self.push_outcome(Err(BackendError::Unavailable("scripted failure".into())));
        }
    }

    pub(crate) fn health_calls(&self) -> u32 {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn recognize_calls(&self) -> u32 {
        self.recognize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn recognize(
        &self,
        _image: &[u8],
        _language: &str,
    ) -> Result<RecognitionResult, BackendError> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(RecognitionResult::success(vec![ArtworkCandidate::new(
                "Mona Lisa",
                "Leonardo da Vinci",
                0.97,
            )]))
        })
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.probe_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

pub(crate) fn as_shared(backends: &[Arc<MockBackend>]) -> Vec<SharedBackend> {
    backends
        .iter()
        .map(|b| b.clone() as SharedBackend)
        .collect()
}
