//! Recognition with retry and fallback
//!
//! Each ranked candidate is called as
//! `circuit_breaker.call(retry.call_with(monitor.track(backend.recognize)))`.
//! Errors that
//! trigger fallback move on to the next candidate, up to `1 + max_fallbacks`
//! candidates in total.

use super::Dispatcher;
use crate::core::backend::{ArtworkCandidate, BackendError, RecognitionResult, SharedBackend};
use crate::core::router::{SelectionCriteria, SelectionStrategy};
use crate::utils::error::{DispatchError, Result};
use crate::utils::generate_request_id;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// One candidate that was tried and did not produce the result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AttemptRecord {
    pub backend: String,
    pub error: String,
}

impl AttemptRecord {
    fn new(backend: &str, error: &DispatchError) -> Self {
        Self {
            backend: backend.to_string(),
            error: error.to_string(),
        }
    }
}

/// Result of a recognize call
///
/// Backend failures are reported here with `success == false`; only
/// selection and admission errors are raised.
#[derive(Debug, Clone, Serialize)]
pub struct RecognitionOutcome {
    pub request_id: String,
    pub success: bool,
    pub candidates: Vec<ArtworkCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Seconds from admission to outcome
    pub processing_time: f64,
    pub attempts: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl RecognitionOutcome {
    fn recognized(
        request_id: String,
        backend: &SharedBackend,
        result: RecognitionResult,
        processing_time: f64,
        attempts: Vec<AttemptRecord>,
    ) -> Self {
        Self {
            request_id,
            success: true,
            candidates: result.candidates,
            model_used: Some(
                result
                    .model_used
                    .unwrap_or_else(|| backend.name().to_string()),
            ),
            provider: Some(backend.provider().to_string()),
            processing_time,
            attempts,
            error: None,
            error_code: None,
        }
    }

    fn failed(
        request_id: String,
        error: &DispatchError,
        processing_time: f64,
        attempts: Vec<AttemptRecord>,
    ) -> Self {
        Self {
            request_id,
            success: false,
            candidates: Vec::new(),
            model_used: None,
            provider: None,
            processing_time,
            attempts,
            error: Some(error.to_string()),
            error_code: Some(error.error_code()),
        }
    }
}

enum Dispatched {
    Recognized {
        backend: SharedBackend,
        result: RecognitionResult,
    },
    Exhausted(DispatchError),
}

impl Dispatcher {
    /// Recognize `image` with the configured request timeout as deadline
    pub async fn recognize_artwork_with_reliability(
        &self,
        image: &[u8],
        language: &str,
        strategy: SelectionStrategy,
    ) -> Result<RecognitionOutcome> {
        let criteria = SelectionCriteria::new(strategy).with_input_size(image.len());
        self.recognize_with_deadline(image, language, &criteria, self.config.request_timeout)
            .await
    }

    /// Recognize `image`, abandoning the in-flight call once `deadline`
    /// elapses
    ///
    /// An abandoned call records nothing; pending retry sleeps are dropped
    /// with it.
    pub async fn recognize_with_deadline(
        &self,
        image: &[u8],
        language: &str,
        criteria: &SelectionCriteria,
        deadline: Duration,
    ) -> Result<RecognitionOutcome> {
        let request_id = generate_request_id();
        let span = info_span!(
            "recognize",
            request_id = %request_id,
            strategy = %criteria.strategy,
            image_bytes = image.len()
        );

        async move {
            self.admit()?;
            let started = Instant::now();
            let mut attempts = Vec::new();

            let dispatched = tokio::time::timeout(
                deadline,
                self.dispatch(image, language, criteria, &mut attempts),
            )
            .await;
            let processing_time = started.elapsed().as_secs_f64();

            let outcome = match dispatched {
                Ok(Ok(Dispatched::Recognized { backend, result })) => {
                    info!(
                        backend = %backend.name(),
                        fallbacks = attempts.len(),
                        processing_time,
                        "Recognition succeeded"
                    );
                    RecognitionOutcome::recognized(
                        request_id,
                        &backend,
                        result,
                        processing_time,
                        attempts,
                    )
                }
                Ok(Ok(Dispatched::Exhausted(last_error))) => {
                    error!(
                        tried = attempts.len(),
                        error = %last_error,
                        "All candidates failed"
                    );
                    RecognitionOutcome::failed(request_id, &last_error, processing_time, attempts)
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    let e = DispatchError::Timeout(format!(
                        "deadline exceeded after {:?}",
                        deadline
                    ));
                    warn!(deadline_ms = deadline.as_millis() as u64, "Recognition abandoned");
                    RecognitionOutcome::failed(request_id, &e, processing_time, attempts)
                }
            };
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        image: &[u8],
        language: &str,
        criteria: &SelectionCriteria,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Result<Dispatched> {
        let _permit = self.bulkhead.acquire().await?;

        let ranked = self.selector.rank_candidates(criteria).await?;
        let limit = ranked.len().min(self.config.max_fallbacks.saturating_add(1));
        let mut last_error = None;

        for candidate in ranked.into_iter().take(limit) {
            let name = candidate.backend.name().to_string();

            if let Some(limiter) = self.registry.backend_rate_limiter(&name) {
                if let Err(e) = limiter.acquire() {
                    warn!(backend = %name, "Backend rate limited, trying next candidate");
                    attempts.push(AttemptRecord::new(&name, &e));
                    last_error = Some(e);
                    continue;
                }
            }

            let breaker = self.registry.circuit_breaker(&name);
            let retry = self.registry.retry_handler();

            // Counted once the breaker lets the first attempt through
            let mut selected = false;
            let state_before = breaker.state();
            let started = Instant::now();
            let outcome = breaker
                .call(retry.call_with(
                    || {
                        if !selected {
                            selected = true;
                            self.selector.mark_selected(&candidate);
                        }
                        self.monitor
                            .track(&name, invoke(&candidate.backend, image, language))
                    },
                    BackendError::is_retryable,
                ))
                .await;
            let elapsed = started.elapsed().as_secs_f64();
            let backend = candidate.backend;
            self.monitor
                .record_circuit_transition(&name, state_before, breaker.state());

            match outcome {
                Ok(result) => {
                    self.record_outcome(&name, true, elapsed);
                    return Ok(Dispatched::Recognized { backend, result });
                }
                Err(e @ DispatchError::CircuitOpen { .. }) => {
                    debug!(backend = %name, "Circuit open, trying next candidate");
                    attempts.push(AttemptRecord::new(&name, &e));
                    last_error = Some(e);
                }
                Err(e) => {
                    self.record_outcome(&name, false, elapsed);
                    warn!(backend = %name, error = %e, "Backend failed");
                    attempts.push(AttemptRecord::new(&name, &e));
                    if !e.triggers_fallback() {
                        return Ok(Dispatched::Exhausted(e));
                    }
                    last_error = Some(e);
                }
            }
        }

        Ok(Dispatched::Exhausted(last_error.unwrap_or_else(|| {
            criteria_error(criteria, "No candidates could be attempted")
        })))
    }
}

fn criteria_error(criteria: &SelectionCriteria, reason: &str) -> DispatchError {
    match &criteria.provider {
        Some(provider) => DispatchError::no_model_for(provider.clone(), reason),
        None => DispatchError::no_model(reason),
    }
}

/// One backend call; an unsuccessful result counts as a failure
async fn invoke(
    backend: &SharedBackend,
    image: &[u8],
    language: &str,
) -> std::result::Result<RecognitionResult, BackendError> {
    let result = backend.recognize(image, language).await?;
    if result.success {
        Ok(result)
    } else {
        Err(BackendError::Unsuccessful(
            result
                .error
                .unwrap_or_else(|| "backend reported no match".to_string()),
        ))
    }
}
