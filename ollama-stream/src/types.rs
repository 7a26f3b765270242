//! Generation request and stream frame types.
//!
//! The request body is a single JSON object:
//! ```text
//! {"prompt":"hi","model":"m","options":{"temperature":0.7,"max_tokens":80}}
//! ```
//! Each response line is an object that may carry `response` and `done`.
//! Anything else the server adds (`model`, `created_at`, eval counters) is
//! ignored.

use serde::{Deserialize, Serialize};

/// Default generate endpoint of a local Ollama server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default upper bound on generated tokens.
pub const DEFAULT_MAX_TOKENS: i64 = 80;

/// One text-generation request.
///
/// Values are passed to the server verbatim: an empty prompt, an empty model
/// (server default) or an out-of-range temperature are not rejected here.
///
/// ```
/// use ollama_stream::GenerationRequest;
///
/// let request = GenerationRequest::new("hi")
///     .model("m")
///     .temperature(0.7)
///     .max_tokens(80);
/// assert_eq!(request.prompt(), "hi");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    model: String,
    temperature: f64,
    max_tokens: i64,
}

impl GenerationRequest {
    /// Create a request for `prompt` using the server's default model.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the model identifier. Empty means "server default".
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tokens to generate.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The model identifier, empty for the server default.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// The sampling temperature.
    pub fn temperature_value(&self) -> f64 {
        self.temperature
    }

    /// The maximum token count.
    pub fn max_tokens_value(&self) -> i64 {
        self.max_tokens
    }

    /// Borrowing view of the request in wire format.
    pub(crate) fn body(&self) -> GenerateBody<'_> {
        GenerateBody {
            prompt: &self.prompt,
            model: (!self.model.is_empty()).then_some(self.model.as_str()),
            options: GenerateOptions {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
        }
    }
}

/// Wire body of the generate call.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateBody<'a> {
    pub prompt: &'a str,
    /// Omitted when empty so the server picks its default model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub options: GenerateOptions,
}

/// Sampling options nested under `options`.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateOptions {
    pub temperature: f64,
    pub max_tokens: i64,
}

/// One decoded line of the response stream.
///
/// Absent and `null` fields both fall back to their empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawFrame")]
pub struct StreamFrame {
    /// Generated text carried by this line, possibly empty.
    pub response: String,
    /// Whether the server marked the stream complete.
    pub done: bool,
}

/// Line shape as sent by the server, before defaults are applied.
#[derive(Deserialize)]
struct RawFrame {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: Option<bool>,
}

impl From<RawFrame> for StreamFrame {
    fn from(raw: RawFrame) -> Self {
        Self {
            response: raw.response.unwrap_or_default(),
            done: raw.done.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_uses_defaults() {
        let request = GenerationRequest::new("hello");
        assert_eq!(request.prompt(), "hello");
        assert_eq!(request.model_name(), "");
        assert_eq!(request.temperature_value(), DEFAULT_TEMPERATURE);
        assert_eq!(request.max_tokens_value(), DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn body_serializes_nested_options() {
        let request = GenerationRequest::new("hi")
            .model("m")
            .temperature(0.7)
            .max_tokens(80);
        let value = serde_json::to_value(request.body()).expect("serialize");
        assert_eq!(
            value,
            json!({
                "prompt": "hi",
                "model": "m",
                "options": { "temperature": 0.7, "max_tokens": 80 }
            })
        );
    }

    #[test]
    fn empty_model_is_omitted() {
        let request = GenerationRequest::new("hi");
        let value = serde_json::to_value(request.body()).expect("serialize");
        assert!(value.get("model").is_none(), "got: {value}");
        assert_eq!(value["prompt"], "hi");
    }

    #[test]
    fn out_of_range_options_pass_through() {
        let request = GenerationRequest::new("")
            .temperature(42.5)
            .max_tokens(-1);
        let value = serde_json::to_value(request.body()).expect("serialize");
        assert_eq!(value["prompt"], "");
        assert_eq!(value["options"]["temperature"], 42.5);
        assert_eq!(value["options"]["max_tokens"], -1);
    }

    #[test]
    fn zero_options_are_still_sent() {
        let request = GenerationRequest::new("hi").temperature(0.0).max_tokens(0);
        let value = serde_json::to_value(request.body()).expect("serialize");
        assert_eq!(value["options"], json!({ "temperature": 0.0, "max_tokens": 0 }));
    }

    #[test]
    fn frame_fields_default_when_absent() {
        let frame: StreamFrame = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(frame, StreamFrame::default());

        let frame: StreamFrame = serde_json::from_str(r#"{"done":true}"#).expect("deserialize");
        assert!(frame.done);
        assert!(frame.response.is_empty());
    }

    #[test]
    fn frame_null_fields_take_defaults() {
        let frame: StreamFrame =
            serde_json::from_str(r#"{"response":null,"done":true}"#).expect("deserialize");
        assert!(frame.response.is_empty());
        assert!(frame.done);

        let frame: StreamFrame =
            serde_json::from_str(r#"{"response":"x","done":null}"#).expect("deserialize");
        assert_eq!(frame.response, "x");
        assert!(!frame.done);
    }

    #[test]
    fn frame_ignores_extra_server_fields() {
        let frame: StreamFrame = serde_json::from_str(
            r#"{"model":"llama3.2","created_at":"2024-01-01T00:00:00Z","response":"Hi","done":false,"eval_count":3}"#,
        )
        .expect("deserialize");
        assert_eq!(frame.response, "Hi");
        assert!(!frame.done);
    }
}
