//! Sticky failover across configured backends

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info, warn};

use crate::llm::client::LlmService;
use crate::request::RoutedRequest;
use crate::{InsightsError, Result};

/// Dispatches to the active backend and fails over on rate limits.
///
/// Services are tried from the active index onwards. A service that ends a
/// call with `RateLimitExceeded` hands the request to the next one; when a
/// later service succeeds it becomes the active one for subsequent calls.
pub struct LlmOrchestrator {
    services: Vec<Box<dyn LlmService>>,
    active: AtomicUsize,
}

impl LlmOrchestrator {
    pub fn new(services: Vec<Box<dyn LlmService>>) -> Result<Self> {
        if services.is_empty() {
            return Err(InsightsError::Config(
                "at least one LLM backend must be configured".to_string(),
            ));
        }
        info!(services = services.len(), "LLM orchestrator initialized");
        Ok(Self {
            services,
            active: AtomicUsize::new(0),
        })
    }

    /// Index of the service new requests start with.
    pub fn active_index(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn active_service(&self) -> &'static str {
        self.services[self.active_index()].name()
    }

    pub async fn run(&self, request: &RoutedRequest) -> Result<String> {
        let start = self.active_index();

        for (index, service) in self.services.iter().enumerate().skip(start) {
            info!(
                service = service.name(),
                kind = %request.response_kind(),
                "Attempting service"
            );

            match service.run(request).await {
                Ok(text) => {
                    if index != start {
                        self.active.fetch_max(index, Ordering::AcqRel);
                        info!(service = service.name(), "Permanently switched to service");
                    }
                    return Ok(text);
                }
                Err(InsightsError::RateLimitExceeded(reason)) => {
                    warn!(
                        service = service.name(),
                        "Service rate limited, attempting next service: {}", reason
                    );
                }
                Err(e) => return Err(e),
            }
        }

        error!("All configured LLM services failed to process the request");
        Err(InsightsError::AllServicesFailed)
    }
}
