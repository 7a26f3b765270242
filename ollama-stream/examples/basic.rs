//! Stream a completion from a local Ollama server.
//!
//! Make sure Ollama is running locally and run:
//!   cargo run --example basic

use std::io::Write;
use std::time::Duration;

use ollama_stream::{DEFAULT_ENDPOINT, GenerationRequest, Generator, deadline};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let generator = Generator::new();
    let request = GenerationRequest::new("Say hello in one sentence.").model("llama3.2");
    let cancel = deadline(&CancellationToken::new(), Duration::from_secs(30));

    let summary = generator
        .stream(DEFAULT_ENDPOINT, &request, &cancel, |fragment: &str| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        })
        .await?;

    println!();
    println!(
        "Fragments: {} ({} lines skipped, ended by {:?})",
        summary.fragments, summary.skipped, summary.termination
    );

    Ok(())
}
