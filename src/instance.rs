//! Process-wide AI service handle
//!
//! The handle is built lazily by the first caller. Concurrent first callers
//! wait on a single initialization; once published, reads are a single
//! atomic load. A failed construction is not cached: the next caller runs
//! construction again.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::credentials::CredentialPool;
use crate::executor::AiExecutor;
use crate::llm::{build_services, LlmOrchestrator};
use crate::request::{route, Request};
use crate::{InsightsError, Result};

/// Everything a request needs: key pool, backends, and the worker pool.
pub struct ServiceHandle {
    pool: Option<Arc<CredentialPool>>,
    llm: Arc<LlmOrchestrator>,
    executor: AiExecutor,
}

impl ServiceHandle {
    pub fn new(
        pool: Option<Arc<CredentialPool>>,
        llm: LlmOrchestrator,
        executor: AiExecutor,
    ) -> Self {
        Self {
            pool,
            llm: Arc::new(llm),
            executor,
        }
    }

    /// Fetch credentials (when a Gemini backend is configured) and assemble backends.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let pool = if settings.uses_gemini() {
            let provider = settings.key_provider();
            Some(Arc::new(CredentialPool::from_provider(provider.as_ref())?))
        } else {
            None
        };

        let services = build_services(settings, pool.as_ref())?;
        Ok(Self::new(
            pool,
            LlmOrchestrator::new(services)?,
            AiExecutor::new(),
        ))
    }

    pub fn credential_pool(&self) -> Option<&Arc<CredentialPool>> {
        self.pool.as_ref()
    }

    pub fn orchestrator(&self) -> &LlmOrchestrator {
        &self.llm
    }

    pub fn executor(&self) -> &AiExecutor {
        &self.executor
    }

    /// Route `request`, run it on the executor, and format the reply.
    pub async fn process(&self, request: Request) -> Result<String> {
        let routed = route(&request)?;
        let llm = Arc::clone(&self.llm);

        self.executor
            .execute(async move {
                let text = llm.run(&routed).await?;
                let response = routed.wrap_response(text);
                routed.format_output(&response)
            })
            .await?
    }
}

/// A lazily built, shared value with retry-on-failure initialization.
pub struct ServiceCell<T> {
    cell: OnceCell<Arc<T>>,
}

impl<T> ServiceCell<T> {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// The value, if already built.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Return the shared value, building it with `init` if nobody has yet.
    ///
    /// Only one `init` runs at a time. If it fails, the triggering caller
    /// gets `InitializationFailure` and the cell stays empty.
    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(Arc::clone(value));
        }

        self.cell
            .get_or_try_init(|| async {
                debug!("No AI instance found, creating a new instance");
                init().await.map(Arc::new)
            })
            .await
            .map(Arc::clone)
            .map_err(|e| {
                error!("Failure in initialising AI service: {:#}", e);
                InsightsError::InitializationFailure(format!("{:#}", e))
            })
    }
}

impl<T> Default for ServiceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

static SERVICE: ServiceCell<ServiceHandle> = ServiceCell::new();

/// The process-wide handle, built from the on-disk settings on first use.
pub async fn instance() -> Result<Arc<ServiceHandle>> {
    SERVICE
        .get_or_try_init(|| async {
            let settings = Settings::load()?;
            build_handle(&settings)
        })
        .await
}

/// The process-wide handle, built from `settings` if it does not exist yet.
pub async fn instance_with(settings: &Settings) -> Result<Arc<ServiceHandle>> {
    SERVICE
        .get_or_try_init(|| async { build_handle(settings) })
        .await
}

fn build_handle(settings: &Settings) -> anyhow::Result<ServiceHandle> {
    let handle = ServiceHandle::from_settings(settings)?;
    info!("AI service instance ready");
    Ok(handle)
}
