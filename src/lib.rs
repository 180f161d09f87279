//! # llm-relay
//!
//! Single-shot CLI adapter for LLM providers: read one JSON job from
//! standard input, forward the prompt to the selected provider, and emit
//! one normalized JSON envelope on standard output.
//!
//! One invocation performs exactly one generation request — no retries, no
//! streaming, no shared state. Failures are reported inside the envelope
//! (`code` + `description`); the process always exits 0.
//!
//! ## Pipeline
//!
//! ```text
//! stdin ──► Job ──► RequestParameters ──► ProviderSelection
//!                                              │
//!            Envelope ◄── interpret ◄── Backend::complete (timeout-bounded)
//! ```
//!
//! ## Core Concepts
//!
//! - **[`Job`]** — the single input object, `{"params": {...}}`.
//! - **[`RequestParameters`]** — typed, coerced view of the job params.
//! - **[`ProviderSelection`]** — resolved provider record, model name,
//!   credential, and endpoint. Built from a fixed provider table; adding a
//!   provider is one table row.
//! - **[`Backend`]** — object-safe trait translating the normalized request
//!   into one provider wire dialect (OpenAI-compatible, Anthropic, Gemini,
//!   Ollama).
//! - **[`Envelope`]** — the one JSON line written per invocation.
//!
//! ## Example (library use)
//!
//! ```no_run
//! use llm_relay::{relay, Envelope, Job};
//!
//! #[tokio::main]
//! async fn main() {
//!     let job: Job = serde_json::from_str(
//!         r#"{"params": {"model": "ollama/llama3.2", "prompt": "Why is the sky blue?"}}"#,
//!     )
//!     .unwrap();
//!
//!     let envelope = match relay::run(&job, |k| std::env::var(k).ok()).await {
//!         Ok(data) => Envelope::success(data),
//!         Err(e) => Envelope::failure(&e),
//!     };
//!     envelope.write(&mut std::io::stdout().lock()).unwrap();
//! }
//! ```

pub mod backend;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod interpret;
pub mod job;
pub mod params;
pub mod provider;
pub mod relay;

pub use backend::{Backend, LlmRequest, LlmResponse, SamplingConfig};
pub use envelope::Envelope;
pub use error::{RelayError, Result};
pub use job::{read_job, Job};
pub use params::RequestParameters;
pub use provider::{ProviderSelection, ProviderSpec};
