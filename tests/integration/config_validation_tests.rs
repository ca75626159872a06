//! Configuration validation integration tests
//!
//! Tests for configuration loading and validation across all config
//! components. These tests verify that valid configuration is accepted and
//! invalid configuration is rejected before a dispatcher is built.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;
    use vision_dispatch::config::models::{
        CircuitBreakerConfig, DispatcherConfig, Environment, RateLimitConfig, RetryConfig,
    };
    use vision_dispatch::config::{Config, Validate};
    use vision_dispatch::{DispatchError, Dispatcher, SelectionStrategy};

    const FULL_CONFIG: &str = r#"
environment: production
default_strategy: adaptive
circuit_breaker:
  failure_threshold: 4
  recovery_timeout: 120
  half_open_max_calls: 3
  success_threshold: 2
retry:
  max_attempts: 4
  base_delay: 0.5
  max_delay: 8
  exponential_base: 3.0
  jitter: false
rate_limit:
  enabled: true
  requests_per_minute: 120
  burst_allowance: 20
backend_rate_limit:
  requests_per_minute: 30
  burst_allowance: 5
health:
  cache_interval: 30
  probe_timeout: 5
selector:
  balanced_weights:
    accuracy: 0.5
    cost: 0.25
    speed: 0.25
  stats_window: 50
max_concurrent_requests: 16
request_timeout: 45
max_fallbacks: 2
logging:
  level: info
  json: true
backends:
  - name: gpt-4o
    provider: openai
    cost:
      per_call: 0.01
      per_megabyte: 0.002
    accuracy_score: 0.92
    avg_response_time: 2.5
    capabilities: [multilingual]
  - name: gemini-pro-vision
    provider: google
    cost:
      per_call: 0.025
    accuracy_score: 0.88
    avg_response_time: 1.5
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // ==================== Loading ====================

    /// Test that a full YAML file loads every section
    #[tokio::test]
    async fn test_load_full_config_file() {
        let file = write_config(FULL_CONFIG);
        let config = Config::from_file(file.path()).await.unwrap();
        let d = &config.dispatcher;

        assert_eq!(d.environment, Environment::Production);
        assert_eq!(d.default_strategy, SelectionStrategy::Adaptive);
        assert_eq!(d.circuit_breaker.recovery_timeout, Duration::from_secs(120));
        assert_eq!(d.retry.base_delay, Duration::from_millis(500));
        assert_eq!(d.rate_limit.burst_allowance, 20);
        assert_eq!(d.backend_rate_limit.as_ref().unwrap().requests_per_minute, 30);
        assert_eq!(d.health.cache_interval, Duration::from_secs(30));
        assert_eq!(d.selector.balanced_weights.accuracy, 0.5);
        assert_eq!(d.selector.adaptive.base_weight, 0.7);
        assert_eq!(d.request_timeout, Duration::from_secs(45));
        assert_eq!(d.backends.len(), 2);
        assert!(d.backend("gpt-4o").unwrap().has_capability("multilingual"));
        assert_eq!(d.backend("gemini-pro-vision").unwrap().cost.per_megabyte, 0.0);
    }

    /// Test that the shipped example configuration is valid
    #[test]
    fn test_example_config_is_valid() {
        let config =
            Config::from_yaml_str(include_str!("../../config/dispatcher.yaml.example")).unwrap();
        assert_eq!(config.dispatcher.backends.len(), 3);
        assert_eq!(config.dispatcher.default_strategy, SelectionStrategy::Balanced);
    }

    /// Test that a missing file is a configuration error
    #[tokio::test]
    async fn test_missing_file() {
        let err = Config::from_file("/nonexistent/dispatcher.yaml")
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    /// Test that serialised config parses back to the same value
    #[test]
    fn test_yaml_export_reloads() {
        let config = Config::from_yaml_str(FULL_CONFIG).unwrap();
        let exported = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml_str(&exported).unwrap(), config);
        assert!(config.to_json().unwrap().contains("\"default_strategy\": \"adaptive\""));
    }

    /// Test that an unknown strategy name is rejected at parse time
    #[test]
    fn test_unknown_strategy_in_yaml() {
        let err = Config::from_yaml_str("default_strategy: cheapest\n").unwrap_err();
        assert!(err.to_string().contains("cheapest"));
    }

    // ==================== Environment ====================

    /// Test that environment variables override the preset
    #[test]
    fn test_env_overrides() {
        let vars = [
            ("VISION_DISPATCH_ENVIRONMENT", "production"),
            ("VISION_DISPATCH_DEFAULT_STRATEGY", "speed"),
            ("VISION_DISPATCH_FAILURE_THRESHOLD", "8"),
            ("VISION_DISPATCH_REQUEST_TIMEOUT", "12.5"),
        ];
        let config = Config::from_env_with(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();

        assert_eq!(config.dispatcher.environment, Environment::Production);
        assert_eq!(config.dispatcher.default_strategy, SelectionStrategy::Speed);
        assert_eq!(config.circuit_breaker().failure_threshold, 8);
        assert_eq!(config.dispatcher.request_timeout, Duration::from_millis(12_500));
        assert_eq!(config.rate_limit().requests_per_minute, 100);
    }

    /// Test that an override producing invalid config is rejected
    #[test]
    fn test_env_override_is_validated() {
        let err = Config::from_env_with(|key| {
            (key == "VISION_DISPATCH_RECOVERY_TIMEOUT").then(|| "3".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("recovery timeout"));
    }

    // ==================== Component Validation ====================

    /// Test that every preset is valid
    #[test]
    fn test_presets_are_valid() {
        for env in [Environment::Development, Environment::Production] {
            assert!(DispatcherConfig::for_environment(env).validate().is_ok());
        }
    }

    /// Test circuit breaker bounds
    #[test]
    fn test_circuit_breaker_bounds() {
        let short = CircuitBreakerConfig {
            recovery_timeout: Duration::from_secs(9),
            ..Default::default()
        };
        assert!(short.validate().is_err());

        let zero = CircuitBreakerConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let unreachable = CircuitBreakerConfig {
            half_open_max_calls: 1,
            success_threshold: 2,
            ..Default::default()
        };
        assert!(unreachable.validate().is_err());
    }

    /// Test retry bounds
    #[test]
    fn test_retry_bounds() {
        let inverted = RetryConfig {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(5),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let flat = RetryConfig {
            exponential_base: 1.0,
            ..Default::default()
        };
        assert!(flat.validate().is_err());
    }

    /// Test the burst allowance contract
    #[test]
    fn test_rate_limit_burst_contract() {
        assert!(RateLimitConfig::new(60, 30).validate().is_ok());
        assert!(RateLimitConfig::new(60, 31).validate().is_err());
        assert!(RateLimitConfig::new(0, 0).validate().is_err());
    }

    /// Test that a disabled admission bucket is not validated
    #[test]
    fn test_disabled_rate_limit_skips_validation() {
        let mut config = DispatcherConfig::default();
        config.rate_limit = RateLimitConfig {
            enabled: false,
            requests_per_minute: 0,
            burst_allowance: 0,
        };
        assert!(config.validate().is_ok());
    }

    /// Test that descriptor errors surface while parsing
    #[test]
    fn test_invalid_descriptor_is_rejected() {
        let yaml = r#"
backends:
  - name: broken
    provider: openai
    accuracy_score: 1.5
    avg_response_time: 1.0
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("accuracy"));
    }

    /// Test that two descriptors may not share a name
    #[test]
    fn test_duplicate_backend_names() {
        let yaml = r#"
backends:
  - name: gpt-4o
    provider: openai
    accuracy_score: 0.9
    avg_response_time: 2.0
  - name: gpt-4o
    provider: azure
    accuracy_score: 0.9
    avg_response_time: 2.0
"#;
        let err = Config::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Duplicate backend name: gpt-4o"));
    }

    /// Test that a dispatcher refuses an invalid runtime swap
    #[test]
    fn test_runtime_update_validation() {
        let dispatcher = Dispatcher::builder().build().unwrap();
        let err = dispatcher
            .update_reliability_config(None, None, Some(RateLimitConfig::new(10, 8)))
            .unwrap_err();

        assert!(matches!(err, DispatchError::Config(_)));
        assert_eq!(dispatcher.registry().rate_limit_config().burst_allowance, 10);
    }
}
