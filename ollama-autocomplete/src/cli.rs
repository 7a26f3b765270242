use std::time::Duration;

use clap::Parser;
use ollama_stream::{DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationRequest};

#[derive(Parser, Debug)]
#[command(name = "autocomplete")]
#[command(version, about = "Stream a completion from a local Ollama server")]
pub struct Cli {
    /// Prompt to complete
    #[arg(default_value = "Write a short poem about autumn leaves.")]
    pub prompt: String,

    /// Generate endpoint URL
    #[arg(long, env = "OLLAMA_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model name (empty string uses the server default)
    #[arg(short, long, env = "OLLAMA_MODEL", default_value = "deepseek-r1")]
    pub model: String,

    /// Sampling temperature
    #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE, allow_negative_numbers = true)]
    pub temperature: f64,

    /// Maximum number of tokens to generate
    #[arg(long, default_value_t = DEFAULT_MAX_TOKENS, allow_negative_numbers = true)]
    pub max_tokens: i64,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(self.prompt.as_str())
            .model(self.model.as_str())
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
