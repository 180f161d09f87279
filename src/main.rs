//! Binary entry point: stdin job → envelope on stdout, always exit 0.

use std::io::{self, Write};

use tracing_subscriber::EnvFilter;

use llm_relay::{relay, Envelope};

/// Initialize tracing to stderr — stdout must stay a single envelope line.
///
/// `quiet` is an explicit value (from `LLM_RELAY_QUIET`) rather than a
/// process-wide mutable flag; `RUST_LOG` still takes precedence when set.
fn init_tracing(quiet: bool) {
    let default_directive = if quiet { "llm_relay=error" } else { "llm_relay=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn quiet_from_env() -> bool {
    std::env::var("LLM_RELAY_QUIET")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() {
    init_tracing(quiet_from_env());

    let envelope = match run().await {
        Ok(data) => Envelope::success(data),
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "relay failed");
            Envelope::failure(&e)
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = envelope.write(&mut stdout) {
        // Nothing left to report through stdout at this point.
        eprintln!("llm-relay: failed to write envelope: {}", e);
    }
    let _ = stdout.flush();
}

async fn run() -> llm_relay::Result<serde_json::Value> {
    let job = llm_relay::read_job(&mut io::stdin().lock())?;
    relay::run(&job, |key| std::env::var(key).ok()).await
}
