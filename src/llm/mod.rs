//! LLM module for insights
//!
//! Backend adapters (wire formats), the HTTP services that use them, and the
//! orchestrator that fails over between configured backends.

mod adapter;
mod client;
mod gemini;
mod ollama;
mod orchestrator;
pub mod prompts;

pub use adapter::{BackendAdapter, BackendKind};
pub use client::{build_services, LlmService};
pub use gemini::GeminiService;
pub use ollama::OllamaService;
pub use orchestrator::LlmOrchestrator;
