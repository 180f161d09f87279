//! The relay pipeline: job in, payload out.
//!
//! Glues the stages together in their fixed order — normalize, resolve,
//! execute, interpret. Every stage fails fast; the caller turns the single
//! outer `Result` into the output envelope.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::backend::{LlmRequest, SamplingConfig};
use crate::error::Result;
use crate::executor;
use crate::interpret;
use crate::job::Job;
use crate::params::RequestParameters;
use crate::provider::{self, ProviderSelection};

/// Build the normalized wire request from the resolved parameters.
///
/// The model name comes from the selection, not the raw params — provider
/// prefixes are already stripped at this point.
pub fn build_request(params: &RequestParameters, selection: &ProviderSelection) -> LlmRequest {
    LlmRequest {
        model: selection.model.clone(),
        system_prompt: params.system_prompt.clone(),
        prompt: params.prompt.clone(),
        sampling: SamplingConfig {
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stop_sequences: params.stop_sequences.clone(),
        },
    }
}

/// Run one job to completion and return the success payload.
///
/// `env` supplies environment-variable lookups (the process passes
/// `std::env::var`; tests pass a map).
pub async fn run(job: &Job, env: impl Fn(&str) -> Option<String>) -> Result<Value> {
    let params = RequestParameters::from_job(job)?;
    let selection = provider::resolve(&params, env)?;
    debug!(?selection, "resolved provider");

    let backend = selection.backend();
    let request = build_request(&params, &selection);

    let client = Client::new();
    let response = executor::execute(
        backend.as_ref(),
        &client,
        &selection.base_url,
        &request,
        params.timeout,
    )
    .await?;

    interpret::interpret(&response.text, params.expect_json)
}
