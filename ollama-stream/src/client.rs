//! Generation client and the fragment sink capability.

use tokio_util::sync::CancellationToken;

use crate::error::{StreamError, map_send_error};
use crate::streaming::{StreamSummary, pump};
use crate::types::GenerationRequest;

/// Upper bound on how much of a rejected response's body is kept.
pub const MAX_ERROR_BODY: usize = 4096;

/// Receives generated text fragments, in arrival order.
///
/// Runs synchronously inside the decode loop, so implementations should
/// return quickly. Any `FnMut(&str)` closure is a sink.
pub trait TokenSink {
    /// Handle one non-empty fragment.
    fn on_fragment(&mut self, fragment: &str);
}

impl<F> TokenSink for F
where
    F: FnMut(&str),
{
    fn on_fragment(&mut self, fragment: &str) {
        self(fragment)
    }
}

/// Client for streaming generate calls.
///
/// Holds only transport settings. Each call owns its own request and
/// response; nothing is shared between calls beyond the HTTP client.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ollama_stream::Generator;
///
/// let http = reqwest::Client::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .build()
///     .expect("client");
/// let generator = Generator::with_client(http);
/// ```
#[derive(Debug, Clone)]
pub struct Generator {
    pub(crate) client: reqwest::Client,
}

impl Generator {
    /// Create a generator with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a generator on top of a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Send `request` to `endpoint` and stream fragments into `sink`.
    ///
    /// Returns once a `done` line is seen, the body ends, or the call fails.
    /// `cancel` aborts the connect, the wait for headers and every body read.
    /// The response is released before this returns, on every path.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Encoding`] if the body cannot be serialized.
    /// - [`StreamError::Transport`] if the request fails or is cancelled
    ///   before headers arrive.
    /// - [`StreamError::Server`] on any status other than `200 OK`. At most
    ///   [`MAX_ERROR_BODY`] bytes of the body are kept.
    /// - [`StreamError::StreamInterrupted`] if the body read fails or is
    ///   cancelled.
    pub async fn stream<K>(
        &self,
        endpoint: &str,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        mut sink: K,
    ) -> Result<StreamSummary, StreamError>
    where
        K: TokenSink,
    {
        let body = serde_json::to_vec(&request.body())?;

        tracing::debug!(
            endpoint,
            model = request.model_name(),
            "sending streaming generate request"
        );

        let send = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::cancelled_before_headers()),
            response = send => response.map_err(map_send_error)?,
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => String::new(),
                body = read_error_body(response) => body,
            };
            tracing::debug!(%status, "generate request rejected");
            return Err(StreamError::Server { status, body });
        }

        pump(response.bytes_stream(), cancel, &mut sink).await
    }
}

/// Read up to [`MAX_ERROR_BODY`] bytes of a rejected response.
///
/// Read failures keep whatever arrived before them.
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    body.truncate(MAX_ERROR_BODY);
    String::from_utf8_lossy(&body).into_owned()
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream one generation with a fresh client.
///
/// Convenience entry point taking every request parameter directly; see
/// [`Generator::stream`] for behavior and errors.
///
/// ```no_run
/// use ollama_stream::{DEFAULT_ENDPOINT, generate_stream};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), ollama_stream::StreamError> {
/// let cancel = CancellationToken::new();
/// generate_stream("hi", DEFAULT_ENDPOINT, "llama3.2", 0.7, 80, &cancel, |t: &str| print!("{t}"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub async fn generate_stream<K>(
    prompt: &str,
    endpoint: &str,
    model: &str,
    temperature: f64,
    max_tokens: i64,
    cancel: &CancellationToken,
    sink: K,
) -> Result<(), StreamError>
where
    K: TokenSink,
{
    let request = GenerationRequest::new(prompt)
        .model(model)
        .temperature(temperature)
        .max_tokens(max_tokens);
    Generator::new()
        .stream(endpoint, &request, cancel, sink)
        .await
        .map(|_| ())
}
