//! Scripted vision backend
//!
//! Behaves like a real adapter: it sleeps for its configured latency and
//! answers from a queue of scripted outcomes, succeeding once the queue is
//! drained. Counters record every call.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use vision_dispatch::{
    ArtworkCandidate, BackendAdapter, BackendDescriptor, BackendError, CostModel,
    RecognitionResult, SharedBackend,
};

type Outcome = Result<RecognitionResult, BackendError>;

pub struct ScriptedBackend {
    descriptor: BackendDescriptor,
    healthy: AtomicBool,
    latency: Mutex<Duration>,
    script: Mutex<VecDeque<Outcome>>,
    recognize_calls: AtomicUsize,
    health_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(name: &str, provider: &str) -> Self {
        Self {
            descriptor: BackendDescriptor::new(name, provider),
            healthy: AtomicBool::new(true),
            latency: Mutex::new(Duration::ZERO),
            script: Mutex::new(VecDeque::new()),
            recognize_calls: AtomicUsize::new(0),
            health_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn cost(mut self, per_call: f64) -> Self {
        self.descriptor.cost = CostModel::per_call(per_call);
        self
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.descriptor.accuracy_score = accuracy;
        self
    }

    pub fn response_time(mut self, seconds: f64) -> Self {
        self.descriptor.avg_response_time = seconds;
        self
    }

    pub fn capability(mut self, capability: &str) -> Self {
        self.descriptor.capabilities.push(capability.to_string());
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    pub fn fail_next(&self, times: usize) {
        let mut script = self.script.lock();
        for _ in 0..times {
            script.push_back(Err(BackendError::Unavailable("503 from provider".into())));
        }
    }

    pub fn respond_with(&self, outcome: Outcome) {
        self.script.lock().push_back(outcome);
    }

    pub fn recognize_calls(&self) -> usize {
        self.recognize_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendAdapter for ScriptedBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    async fn recognize(&self, _image: &[u8], language: &str) -> Outcome {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.script.lock().pop_front();
        scripted.unwrap_or_else(|| {
            let title = if language == "fr" {
                "La Joconde"
            } else {
                "Mona Lisa"
            };
            Ok(RecognitionResult::success(vec![ArtworkCandidate::new(
                title,
                "Leonardo da Vinci",
                0.97,
            )]))
        })
    }

    async fn health_check(&self) -> Result<bool, BackendError> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.healthy.load(Ordering::SeqCst))
    }
}

pub fn as_shared(backends: &[Arc<ScriptedBackend>]) -> Vec<SharedBackend> {
    backends
        .iter()
        .map(|b| b.clone() as SharedBackend)
        .collect()
}
