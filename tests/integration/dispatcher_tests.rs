//! Dispatcher integration tests
//!
//! Recognition with retry, fallback, circuit breaking and deadlines.

#[cfg(test)]
mod tests {
    use crate::common::{dispatcher, gallery, test_config};
    use std::sync::Arc;
    use std::time::Duration;
    use vision_dispatch::config::models::CircuitBreakerConfig;
    use vision_dispatch::{BackendError, CircuitState, SelectionCriteria, SelectionStrategy};

    const IMAGE: &[u8] = b"jpeg bytes of a portrait";

    /// Test the cheapest backend answers when everything is healthy
    #[tokio::test(start_paused = true)]
    async fn test_recognize_with_cheapest_backend() {
        let backends = gallery();
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.model_used.as_deref(), Some("gpt-4o"));
        assert_eq!(outcome.candidates[0].artist, "Leonardo da Vinci");
        assert!(!outcome.request_id.is_empty());
    }

    /// Test the language is passed through to the backend
    #[tokio::test(start_paused = true)]
    async fn test_language_is_forwarded() {
        let dispatcher = dispatcher(test_config(), &gallery());

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "fr", SelectionStrategy::Cost)
            .await
            .unwrap();

        assert_eq!(outcome.candidates[0].name, "La Joconde");
    }

    /// Test a backend that exhausts its retries hands over to the next candidate
    #[tokio::test(start_paused = true)]
    async fn test_fallback_to_next_ranked_candidate() {
        let backends = gallery();
        backends[0].fail_next(3);
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.model_used.as_deref(), Some("gemini-pro-vision"));
        assert_eq!(outcome.attempts.len(), 1);
        assert_eq!(outcome.attempts[0].backend, "gpt-4o");
        assert_eq!(backends[0].recognize_calls(), 3);
        assert_eq!(backends[1].recognize_calls(), 0);

        let stats = dispatcher.selector().model_stats("gpt-4o").unwrap();
        assert_eq!(stats.failed_requests, 1);
        assert_eq!(stats.success_rate, 0.0);
    }

    /// Test a terminal failure is a structured result, not an error
    #[tokio::test(start_paused = true)]
    async fn test_all_backends_failing_returns_failure_result() {
        let backends = gallery();
        for backend in &backends {
            backend.fail_next(3);
        }
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Balanced)
            .await
            .unwrap();

        assert!(!outcome.success);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.attempts.len(), 3);
        assert_eq!(outcome.error_code, Some("RETRY_EXHAUSTED"));
        for backend in &backends {
            assert_eq!(backend.recognize_calls(), 3);
        }
    }

    /// Test unhealthy backends are never called
    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_backend_is_not_called() {
        let backends = gallery();
        backends[0].set_healthy(false);
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();

        assert_eq!(outcome.model_used.as_deref(), Some("gemini-pro-vision"));
        assert_eq!(backends[0].recognize_calls(), 0);
    }

    /// Test an open circuit is skipped and recovers after its timeout
    #[tokio::test(start_paused = true)]
    async fn test_circuit_opens_and_recovers() {
        let backends = gallery();
        let mut config = test_config();
        config.circuit_breaker = CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_secs(10),
            half_open_max_calls: 1,
            success_threshold: 1,
        };
        backends[0].fail_next(3);
        let dispatcher = dispatcher(config, &backends);

        let first = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();
        assert_eq!(first.model_used.as_deref(), Some("gemini-pro-vision"));
        let breaker = dispatcher.registry().circuit_breaker("gpt-4o");
        assert_eq!(breaker.state(), CircuitState::Open);

        let skipped = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();
        assert_eq!(skipped.model_used.as_deref(), Some("gemini-pro-vision"));
        assert_eq!(backends[0].recognize_calls(), 3);
        assert_eq!(dispatcher.load_balancer().request_count("gpt-4o"), 1);
        assert_eq!(dispatcher.load_balancer().request_count("gemini-pro-vision"), 2);

        tokio::time::advance(Duration::from_secs(10)).await;

        let recovered = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();
        assert_eq!(recovered.model_used.as_deref(), Some("gpt-4o"));
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.snapshot().failure_count, 0);
    }

    /// Test invalid input is not retried on the same backend
    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_is_not_retried() {
        let backends = gallery();
        backends[0].respond_with(Err(BackendError::InvalidInput("not an image".into())));
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
            .await
            .unwrap();

        assert_eq!(backends[0].recognize_calls(), 1);
        assert_eq!(outcome.model_used.as_deref(), Some("gemini-pro-vision"));
    }

    /// Test a caller deadline abandons a slow backend
    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_enforced() {
        let backends = gallery();
        backends[0].set_latency(Duration::from_secs(5));
        let dispatcher = dispatcher(test_config(), &backends);

        let outcome = dispatcher
            .recognize_with_deadline(
                IMAGE,
                "en",
                &SelectionCriteria::new(SelectionStrategy::Cost),
                Duration::from_secs(2),
            )
            .await
            .unwrap();

        assert!(!outcome.success);
        assert_eq!(outcome.error_code, Some("TIMEOUT"));
        assert!(outcome.processing_time >= 2.0);
        assert!(dispatcher.selector().model_stats("gpt-4o").is_none());

        let abandoned = dispatcher.monitor().backend_stats("gpt-4o").unwrap();
        assert_eq!(abandoned.cancelled, 1);
        assert_eq!(abandoned.in_flight, 0);
    }

    /// Test concurrent requests are capped by the bulkhead
    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_respect_bulkhead() {
        let backends = gallery();
        backends[0].set_latency(Duration::from_secs(1));
        let mut config = test_config();
        config.max_concurrent_requests = 2;
        let dispatcher = Arc::new(dispatcher(config, &backends));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher
                    .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Cost)
                    .await
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap().success);
        }

        assert_eq!(backends[0].recognize_calls(), 6);
        assert_eq!(backends[0].peak_in_flight(), 2);
        assert_eq!(dispatcher.load_balancer().request_count("gpt-4o"), 6);
    }

    /// Test the status snapshot reflects recorded activity
    #[tokio::test(start_paused = true)]
    async fn test_status_snapshot_serializes() {
        let dispatcher = dispatcher(test_config(), &gallery());
        dispatcher
            .recognize_artwork_with_reliability(IMAGE, "en", SelectionStrategy::Accuracy)
            .await
            .unwrap();

        let status = dispatcher.get_status();
        assert_eq!(status.selector.current_model.as_deref(), Some("claude-3"));
        assert_eq!(status.health_cache.cached_entries, 3);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["reliability"]["circuit_breakers"]["claude-3"]["state"], "closed");
        assert_eq!(json["load_balancer"]["request_counts"]["claude-3"], 1);
        assert!(json["configs"]["circuit_breaker"]["failure_threshold"].is_u64());
        assert_eq!(json["requests"]["backends"]["claude-3"]["completed"], 1);
        assert_eq!(json["requests"]["health_cache_misses"], 3);
        assert_eq!(json["requests"]["active_requests"], 0);
    }
}
