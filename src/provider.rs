//! Provider registry, credential resolution, and backend construction.
//!
//! One static table of [`ProviderSpec`] records drives everything: the
//! provider-specific key variable, the key requirement, the default
//! endpoint, and the wire dialect. Adding a provider means adding one row
//! (plus a [`Dialect`] implementation only if its wire format is new).

use crate::backend::{
    AnthropicBackend, Backend, GeminiBackend, OllamaBackend, OpenAiBackend,
};
use crate::error::{RelayError, Result};
use crate::params::{split_model, strip_local_prefix, RequestParameters};

/// Generic cross-provider API key, consulted after the provider-specific
/// variable.
pub const GENERIC_KEY_ENV: &str = "LLM_API_KEY";

/// Name of the generic OpenAI-compatible local provider, selected whenever
/// a base URL is supplied.
pub const LOCAL_PROVIDER: &str = "local";

/// Wire dialect a provider speaks. Several providers share the
/// OpenAI-compatible schema and differ only in endpoint and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `/v1/chat/completions`, bearer auth.
    OpenAiCompat,
    /// Anthropic `/v1/messages`.
    Anthropic,
    /// Gemini `:generateContent`.
    Gemini,
    /// Ollama `/api/chat`.
    Ollama,
}

/// One provider record: name, credential variable, endpoint, dialect.
#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    /// Lower-case provider name as it appears in `provider/model`.
    pub name: &'static str,
    /// Provider-specific API key variable. `None` marks the provider as
    /// key-exempt (local servers).
    pub key_env: Option<&'static str>,
    /// Default endpoint; `None` means a base URL must be supplied.
    pub default_base_url: Option<&'static str>,
    /// Wire dialect.
    pub dialect: Dialect,
}

/// The fixed provider table.
static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        name: "openai",
        key_env: Some("OPENAI_API_KEY"),
        default_base_url: Some("https://api.openai.com"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "anthropic",
        key_env: Some("ANTHROPIC_API_KEY"),
        default_base_url: Some("https://api.anthropic.com"),
        dialect: Dialect::Anthropic,
    },
    ProviderSpec {
        name: "google",
        key_env: Some("GEMINI_API_KEY"),
        default_base_url: Some("https://generativelanguage.googleapis.com"),
        dialect: Dialect::Gemini,
    },
    ProviderSpec {
        name: "groq",
        key_env: Some("GROQ_API_KEY"),
        default_base_url: Some("https://api.groq.com/openai"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "mistral",
        key_env: Some("MISTRAL_API_KEY"),
        default_base_url: Some("https://api.mistral.ai"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "openrouter",
        key_env: Some("OPENROUTER_API_KEY"),
        default_base_url: Some("https://openrouter.ai/api"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "deepseek",
        key_env: Some("DEEPSEEK_API_KEY"),
        default_base_url: Some("https://api.deepseek.com"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "xai",
        key_env: Some("XAI_API_KEY"),
        default_base_url: Some("https://api.x.ai"),
        dialect: Dialect::OpenAiCompat,
    },
    ProviderSpec {
        name: "ollama",
        key_env: None,
        default_base_url: Some("http://localhost:11434"),
        dialect: Dialect::Ollama,
    },
    ProviderSpec {
        name: LOCAL_PROVIDER,
        key_env: None,
        default_base_url: None,
        dialect: Dialect::OpenAiCompat,
    },
];

/// Look up a provider record by (lower-case) name.
pub fn find(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.name == name)
}

/// All supported provider names, sorted for error messages.
pub fn supported_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PROVIDERS.iter().map(|spec| spec.name).collect();
    names.sort_unstable();
    names
}

/// Resolved provider, model, credential, and endpoint for one request.
#[derive(Clone)]
pub struct ProviderSelection {
    /// The matched provider record.
    pub spec: &'static ProviderSpec,
    /// Model name as the provider expects it (prefix already stripped).
    pub model: String,
    /// Resolved API key, if any.
    pub api_key: Option<String>,
    /// Effective endpoint: the caller's base URL (normalized) or the
    /// provider default.
    pub base_url: String,
}

impl std::fmt::Debug for ProviderSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSelection")
            .field("provider", &self.spec.name)
            .field("model", &self.model)
            .field("api_key", &crate::backend::redact_key(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderSelection {
    /// Construct the wire-dialect backend for this selection.
    pub fn backend(&self) -> Box<dyn Backend> {
        let key = self.api_key.clone();
        match self.spec.dialect {
            Dialect::OpenAiCompat => {
                let mut backend = OpenAiBackend::new();
                if let Some(key) = key {
                    backend = backend.with_api_key(key);
                }
                Box::new(backend)
            }
            Dialect::Anthropic => {
                let mut backend = AnthropicBackend::new();
                if let Some(key) = key {
                    backend = backend.with_api_key(key);
                }
                Box::new(backend)
            }
            Dialect::Gemini => {
                let mut backend = GeminiBackend::new();
                if let Some(key) = key {
                    backend = backend.with_api_key(key);
                }
                Box::new(backend)
            }
            Dialect::Ollama => Box::new(OllamaBackend),
        }
    }
}

/// Resolve provider, model, and credentials from normalized parameters.
///
/// `env` supplies environment-variable lookups so tests never touch process
/// globals. Validation order:
/// 1. the `local` provider without a base URL is a `params` failure;
/// 2. a key-requiring provider with no key and no base URL is an `env`
///    failure naming the provider-specific variable;
/// 3. a provider name absent from the table is a `params` failure listing
///    all supported names.
pub fn resolve(
    params: &RequestParameters,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ProviderSelection> {
    // A base URL targets a generic OpenAI-compatible endpoint regardless of
    // any prefix in the model string.
    let (provider_name, model) = match params.base_url {
        Some(_) => (
            LOCAL_PROVIDER.to_string(),
            strip_local_prefix(&params.model).to_string(),
        ),
        None => split_model(&params.model)?,
    };

    let spec = find(&provider_name);
    let key_env = spec.and_then(|s| s.key_env);

    let api_key = key_env
        .and_then(|var| non_empty(env(var)))
        .or_else(|| non_empty(env(GENERIC_KEY_ENV)));

    if provider_name == LOCAL_PROVIDER && params.base_url.is_none() {
        return Err(RelayError::Params(format!(
            "base_url is required for provider '{}'",
            LOCAL_PROVIDER
        )));
    }

    if let Some(var) = key_env {
        if api_key.is_none() && params.base_url.is_none() {
            return Err(RelayError::Env(format!(
                "No API key found for provider '{}': set {} or {}",
                provider_name, var, GENERIC_KEY_ENV
            )));
        }
    }

    let spec = spec.ok_or_else(|| {
        RelayError::Params(format!(
            "Unknown provider '{}'. Supported providers: {}",
            provider_name,
            supported_names().join(", ")
        ))
    })?;

    let base_url = match &params.base_url {
        Some(url) => normalize_base_url(url),
        None => spec.default_base_url.unwrap_or_default().to_string(),
    };

    Ok(ProviderSelection {
        spec,
        model,
        api_key,
        base_url,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Strip known provider path suffixes from a base URL.
/// This prevents double-pathing when dialects append their own paths.
/// e.g., "https://api.openai.com/v1" -> "https://api.openai.com"
/// e.g., "http://localhost:11434/api" -> "http://localhost:11434"
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    // Longest suffixes first
    for suffix in &[
        "/v1/chat/completions",
        "/v1/chat",
        "/v1",
        "/api/chat",
        "/api",
    ] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}
