#![deny(missing_docs)]
//! Streaming text-generation client for local Ollama-style inference servers.
//!
//! A single call composes a JSON generation request, opens one streaming
//! HTTP response, and pushes every generated fragment to a caller-supplied
//! [`TokenSink`] as soon as its line arrives on the wire.
//!
//! The server answers with newline-delimited JSON, one object per line:
//! ```text
//! {"response":"Hel"}
//! {"response":"lo"}
//! {"done":true}
//! ```
//!
//! Blank or malformed lines are skipped. A `done: true` line ends the call
//! immediately; a body that simply closes also counts as success.
//!
//! # Usage
//!
//! ```no_run
//! use ollama_stream::{DEFAULT_ENDPOINT, GenerationRequest, Generator};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), ollama_stream::StreamError> {
//! let generator = Generator::new();
//! let request = GenerationRequest::new("Write a haiku about Rust.").model("llama3.2");
//! let cancel = CancellationToken::new();
//!
//! let mut text = String::new();
//! generator
//!     .stream(DEFAULT_ENDPOINT, &request, &cancel, |fragment: &str| text.push_str(fragment))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Every call takes a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! by reference. Cancelling it aborts the connect, the header wait, or the
//! current body read; fragments already delivered stay delivered. Use
//! [`deadline`] to derive a token that also fires after a timeout.

pub mod cancel;
pub mod client;
pub mod error;
pub mod streaming;
pub mod types;

pub use cancel::deadline;
pub use client::{Generator, MAX_ERROR_BODY, TokenSink, generate_stream};
pub use error::{Cancelled, StreamError};
pub use streaming::{StreamSummary, Termination};
pub use types::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationRequest, StreamFrame,
};
