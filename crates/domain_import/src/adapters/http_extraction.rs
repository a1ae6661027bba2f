//! HTTP Extraction Adapter
//!
//! Sends one document per call to the extraction service as
//! `multipart/form-data` (`file` and `role` parts) on `POST {base_url}/extract`
//! and reads the JSON answer:
//!
//! ```json
//! { "success": true, "data": { "memberNumber": "123", ... }, "error": null }
//! ```
//!
//! # Error Handling
//!
//! - Connect failures -> `PortError::Connection`
//! - Client-side timeouts -> `PortError::Timeout`
//! - 429 / 5xx without a readable body -> `PortError::ServiceUnavailable`
//! - Unreadable JSON -> `PortError::Transformation`
//!
//! A non-2xx answer whose body is a valid extraction response is passed on
//! as that response, so the service's own error text reaches the user.
//!
//! Repeated transient failures open a circuit breaker; while open, calls
//! fail fast with `ServiceUnavailable`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, CircuitBreakerConfig, DomainPort, HealthCheckResult, HealthCheckable,
    OperationMetadata, PortError,
};

use crate::ports::{ExtractionPort, ExtractionRequest, ExtractionResponse};

const ADAPTER_ID: &str = "http-extraction-adapter";

/// Configuration for the HTTP extraction adapter
#[derive(Debug, Clone)]
pub struct HttpExtractionConfig {
    /// Base URL of the extraction service (e.g., "http://extractor:8000")
    pub base_url: String,

    /// Client-side request timeout in seconds
    pub timeout_secs: u64,

    /// Circuit breaker configuration; `None` disables it
    pub circuit_breaker: Option<CircuitBreakerConfig>,
}

impl Default for HttpExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            circuit_breaker: Some(CircuitBreakerConfig::default()),
        }
    }
}

impl HttpExtractionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct CircuitBreaker {
    config: CircuitBreakerConfig,
    failure_count: AtomicU64,
    success_count: AtomicU64,
    is_open: AtomicBool,
    opened_at: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            failure_count: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            is_open: AtomicBool::new(false),
            opened_at: RwLock::new(None),
        }
    }

    async fn is_available(&self) -> bool {
        if !self.is_open.load(Ordering::Relaxed) {
            return true;
        }

        // Half-open once the reset timeout elapsed: let requests probe
        match *self.opened_at.read().await {
            Some(time) => time.elapsed() > Duration::from_secs(self.config.reset_timeout_secs),
            None => false,
        }
    }

    fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
        if !self.is_open.load(Ordering::Relaxed) {
            return;
        }
        let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= u64::from(self.config.success_threshold) {
            self.is_open.store(false, Ordering::Relaxed);
            self.success_count.store(0, Ordering::Relaxed);
            tracing::info!("Extraction service circuit closed");
        }
    }

    async fn record_failure(&self) {
        self.success_count.store(0, Ordering::Relaxed);
        let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= u64::from(self.config.failure_threshold) {
            if !self.is_open.swap(true, Ordering::Relaxed) {
                tracing::warn!(failures, "Extraction service circuit opened");
            }
            *self.opened_at.write().await = Some(Instant::now());
        }
    }
}

/// Extraction port backed by the HTTP extraction service
#[derive(Debug)]
pub struct HttpExtractionAdapter {
    config: HttpExtractionConfig,
    client: reqwest::Client,
    circuit_breaker: Option<CircuitBreaker>,
}

impl HttpExtractionAdapter {
    /// Creates the adapter and its HTTP client
    ///
    /// # Errors
    ///
    /// `PortError::Internal` if the HTTP client cannot be built
    pub fn new(config: HttpExtractionConfig) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("member-import/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PortError::Internal {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        let circuit_breaker = config.circuit_breaker.clone().map(CircuitBreaker::new);

        Ok(Self {
            config,
            client,
            circuit_breaker,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub async fn is_circuit_open(&self) -> bool {
        match &self.circuit_breaker {
            Some(cb) => !cb.is_available().await,
            None => false,
        }
    }

    async fn record(&self, result: &Result<ExtractionResponse, PortError>) {
        let Some(cb) = &self.circuit_breaker else {
            return;
        };
        match result {
            Err(err) if err.is_transient() => cb.record_failure().await,
            _ => cb.record_success(),
        }
    }

    async fn send(&self, request: ExtractionRequest) -> Result<ExtractionResponse, PortError> {
        let url = self.endpoint("extract");
        let part = Part::bytes(request.file_bytes)
            .file_name(request.file_name)
            .mime_str(&request.content_type)
            .map_err(|e| PortError::validation(format!("invalid content type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("role", request.role.as_str());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout_secs))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout_secs))?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|e| {
                PortError::transformation(format!("unreadable extraction response: {}", e))
            });
        }

        match serde_json::from_slice::<ExtractionResponse>(&body) {
            Ok(answer) if !answer.success => Ok(answer),
            _ => Err(map_status(status)),
        }
    }
}

fn map_transport_error(err: reqwest::Error, timeout_secs: u64) -> PortError {
    if err.is_timeout() {
        PortError::Timeout {
            operation: "extract".to_string(),
            duration_ms: timeout_secs * 1000,
        }
    } else if err.is_connect() {
        PortError::Connection {
            message: "cannot reach extraction service".to_string(),
            source: Some(Box::new(err)),
        }
    } else {
        PortError::Internal {
            message: "extraction request failed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

fn map_status(status: StatusCode) -> PortError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => PortError::ServiceUnavailable {
            service: "extraction service is rate limiting".to_string(),
        },
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: format!("extraction service answered {}", s),
        },
        s => PortError::validation(format!("extraction service rejected the document ({})", s)),
    }
}

impl DomainPort for HttpExtractionAdapter {}

#[async_trait]
impl HealthCheckable for HttpExtractionAdapter {
    /// Calls the service's `/health` endpoint
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();

        if self.is_circuit_open().await {
            return HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Degraded,
                latency_ms: 0,
                message: Some("Circuit breaker is open".to_string()),
                checked_at: Utc::now(),
            };
        }

        let result = self.client.get(self.endpoint("health")).send().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(r) if r.status().is_success() => (AdapterHealth::Healthy, None),
            Ok(r) => (AdapterHealth::Degraded, Some(format!("health endpoint answered {}", r.status()))),
            Err(e) => (AdapterHealth::Unhealthy, Some(e.to_string())),
        };

        HealthCheckResult {
            adapter_id: ADAPTER_ID.to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl ExtractionPort for HttpExtractionAdapter {
    async fn extract(
        &self,
        request: ExtractionRequest,
        metadata: Option<OperationMetadata>,
    ) -> Result<ExtractionResponse, PortError> {
        if self.is_circuit_open().await {
            return Err(PortError::ServiceUnavailable {
                service: "extraction service circuit breaker is open".to_string(),
            });
        }

        let correlation_id = metadata.and_then(|m| m.correlation_id);
        tracing::debug!(
            role = %request.role,
            file = %request.file_name,
            correlation_id = ?correlation_id,
            "Calling extraction service"
        );

        let result = self.send(request).await;
        self.record(&result).await;
        result
    }
}
