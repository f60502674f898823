use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::credentials::CredentialPool;
use crate::llm::adapter::BackendKind;
use crate::llm::gemini::GeminiService;
use crate::llm::ollama::OllamaService;
use crate::request::RoutedRequest;
use crate::{InsightsError, Result};

/// A backend that turns a routed request into reply text.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    async fn run(&self, request: &RoutedRequest) -> Result<String>;
}

/// Build the configured services in dispatch order.
///
/// `pool` must be present when any configured backend is Gemini.
pub fn build_services(
    settings: &Settings,
    pool: Option<&Arc<CredentialPool>>,
) -> Result<Vec<Box<dyn LlmService>>> {
    let timeout = Duration::from_secs(settings.llm.timeout_secs);

    settings
        .backends()
        .into_iter()
        .map(|backend| -> Result<Box<dyn LlmService>> {
            match backend {
                BackendKind::Gemini => {
                    let pool = pool.ok_or_else(|| {
                        InsightsError::Credentials(
                            "Gemini backend configured without a key pool".to_string(),
                        )
                    })?;
                    Ok(Box::new(GeminiService::new(
                        &settings.gemini,
                        timeout,
                        Arc::clone(pool),
                    )?))
                }
                BackendKind::Ollama => Ok(Box::new(OllamaService::new(&settings.ollama, timeout)?)),
            }
        })
        .collect()
}

pub(crate) fn malformed(reason: impl Into<String>, raw: &str) -> InsightsError {
    InsightsError::MalformedBackendResponse {
        reason: reason.into(),
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_backend_requires_pool() {
        let settings = Settings::default();

        let err = match build_services(&settings, None) {
            Ok(_) => panic!("expected service creation to fail"),
            Err(e) => e.to_string(),
        };
        assert!(err.contains("without a key pool"));
    }

    #[test]
    fn builds_primary_then_fallback() {
        let mut settings = Settings::default();
        settings.llm.fallback = Some(BackendKind::Ollama);
        let pool = Arc::new(CredentialPool::new(vec!["k".to_string()]).unwrap());

        let services = build_services(&settings, Some(&pool)).unwrap();
        let names: Vec<_> = services.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["GeminiService", "OllamaService"]);
    }

    #[test]
    fn ollama_only_needs_no_pool() {
        let mut settings = Settings::default();
        settings.llm.backend = BackendKind::Ollama;

        let services = build_services(&settings, None).unwrap();
        assert_eq!(services.len(), 1);
    }
}
