//! Prometheus metrics for the gateway.

use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

/// Request, rejection and fallback counters.
pub struct GatewayMetrics {
    registry: Registry,
    /// Requests by endpoint and response status
    pub requests: CounterVec,
    /// Rate-limit rejections by tier
    pub rate_limited: CounterVec,
    /// Auth failures by error kind
    pub auth_failures: CounterVec,
    /// Provider fallbacks by endpoint
    pub provider_fallbacks: CounterVec,
}

impl GatewayMetrics {
    /// Creates and registers all counters.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = CounterVec::new(
            Opts::new("requests_total", "Total requests handled").namespace("tyt_edge"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(requests.clone()))?;

        let rate_limited = CounterVec::new(
            Opts::new("rate_limited_total", "Requests rejected by the rate limiter")
                .namespace("tyt_edge"),
            &["tier"],
        )?;
        registry.register(Box::new(rate_limited.clone()))?;

        let auth_failures = CounterVec::new(
            Opts::new("auth_failures_total", "Failed credential verifications")
                .namespace("tyt_edge"),
            &["kind"],
        )?;
        registry.register(Box::new(auth_failures.clone()))?;

        let provider_fallbacks = CounterVec::new(
            Opts::new(
                "provider_fallbacks_total",
                "Responses served from fallback payloads",
            )
            .namespace("tyt_edge"),
            &["endpoint"],
        )?;
        registry.register(Box::new(provider_fallbacks.clone()))?;

        Ok(Self {
            registry,
            requests,
            rate_limited,
            auth_failures,
            provider_fallbacks,
        })
    }

    /// Records a handled request.
    pub fn record_request(&self, endpoint: &str, status: u16) {
        self.requests
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    /// Records a rate-limit rejection.
    pub fn record_rate_limited(&self, tier: &str) {
        self.rate_limited.with_label_values(&[tier]).inc();
    }

    /// Records an auth failure.
    pub fn record_auth_failure(&self, kind: &str) {
        self.auth_failures.with_label_values(&[kind]).inc();
    }

    /// Records a fallback-payload response.
    pub fn record_provider_fallback(&self, endpoint: &str) {
        self.provider_fallbacks.with_label_values(&[endpoint]).inc();
    }

    /// Renders the registry in Prometheus text exposition format.
    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
