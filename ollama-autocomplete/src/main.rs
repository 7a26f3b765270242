mod cli;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use ollama_stream::{GenerationRequest, Generator, deadline};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = CancellationToken::new();
    let interrupt = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling generation");
            interrupt.cancel();
        }
    });
    let cancel = deadline(&root, cli.timeout());

    let request = cli.request();
    let mut stdout = io::stdout();
    let full_text = complete(&Generator::new(), &cli.endpoint, &request, &cancel, &mut stdout)
        .await
        .with_context(|| format!("generation against {} failed", cli.endpoint))?;

    println!("\n\n---\nFull text:\n{full_text}");
    Ok(())
}

// Logs go to stderr; stdout carries only generated text.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Stream `request`, echoing each fragment to `out`, and return the full text.
///
/// A failed write cancels the call so a closed pipe does not keep the
/// server generating.
async fn complete<W: Write>(
    generator: &Generator,
    endpoint: &str,
    request: &GenerationRequest,
    cancel: &CancellationToken,
    out: &mut W,
) -> Result<String> {
    let mut full_text = String::new();
    let mut write_error: Option<io::Error> = None;

    let streamed = generator
        .stream(endpoint, request, cancel, |fragment: &str| {
            full_text.push_str(fragment);
            if write_error.is_some() {
                return;
            }
            if let Err(err) = out.write_all(fragment.as_bytes()).and_then(|()| out.flush()) {
                write_error = Some(err);
                cancel.cancel();
            }
        })
        .await;

    if let Some(err) = write_error {
        return Err(err).context("failed to write generated text");
    }
    let summary = streamed?;
    tracing::debug!(
        fragments = summary.fragments,
        skipped = summary.skipped,
        termination = ?summary.termination,
        "generation finished"
    );
    Ok(full_text)
}
