//! Test fixtures
//!
//! Backend sets and configuration with deterministic retry schedules.

use super::backends::{ScriptedBackend, as_shared};
use std::sync::Arc;
use std::time::Duration;
use vision_dispatch::config::models::{DispatcherConfig, RateLimitConfig, RetryConfig};
use vision_dispatch::Dispatcher;

/// Three backends with distinct cost, accuracy and latency profiles
///
/// | name              | cost  | accuracy | time |
/// |-------------------|-------|----------|------|
/// | gpt-4o            | 0.01  | 0.92     | 2.5  |
/// | claude-3          | 0.03  | 0.95     | 3.0  |
/// | gemini-pro-vision | 0.025 | 0.88     | 1.5  |
pub fn gallery() -> Vec<Arc<ScriptedBackend>> {
    vec![
        ScriptedBackend::new("gpt-4o", "openai")
            .cost(0.01)
            .accuracy(0.92)
            .response_time(2.5)
            .capability("multilingual")
            .shared(),
        ScriptedBackend::new("claude-3", "anthropic")
            .cost(0.03)
            .accuracy(0.95)
            .response_time(3.0)
            .capability("multilingual")
            .shared(),
        ScriptedBackend::new("gemini-pro-vision", "google")
            .cost(0.025)
            .accuracy(0.88)
            .response_time(1.5)
            .shared(),
    ]
}

/// Defaults with admission control off and jitter disabled
pub fn test_config() -> DispatcherConfig {
    DispatcherConfig {
        rate_limit: RateLimitConfig {
            enabled: false,
            ..Default::default()
        },
        retry: RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            ..Default::default()
        }
        .without_jitter(),
        ..Default::default()
    }
}

pub fn dispatcher(config: DispatcherConfig, backends: &[Arc<ScriptedBackend>]) -> Dispatcher {
    Dispatcher::builder()
        .config(config)
        .backends(as_shared(backends))
        .build()
        .expect("test dispatcher must build")
}
