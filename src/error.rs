use thiserror::Error;

/// Error types raised by the benchmark harness, the inference client and the evaluator.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Transport-level failure talking to the inference service
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// The inference service answered with a non-success status
    #[error("Provider error: {0}")]
    ProviderError(String),
    /// API response parsing or format error
    #[error("Response format error: {message}. Raw response: {raw_response}")]
    ResponseFormat {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    #[error("JSON parse error: {0}")]
    JsonError(String),
    /// File system errors
    #[error("IO error: {0}")]
    Io(String),
    /// The prompt file could not be read
    #[error("could not read prompt file {path}: {message}")]
    PromptFile { path: String, message: String },
    /// The prompt file was read but holds no text
    #[error("empty prompt in {0}")]
    EmptyPrompt(String),
    /// No models were selected for the run
    #[error("no models specified for benchmark")]
    NoModels,
    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BenchError {
    /// Text recorded as a model's response when its inference call fails.
    pub fn sentinel_response(&self) -> String {
        match self {
            BenchError::HttpError(_) => "Error: Failed to connect to Ollama API".to_string(),
            BenchError::ResponseFormat { .. } | BenchError::JsonError(_) => {
                "Error: Failed to parse response".to_string()
            }
            BenchError::ProviderError(msg) => format!("Error: {msg}"),
            other => format!("Error: {other}"),
        }
    }
}

/// Converts reqwest HTTP errors into BenchErrors
impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        BenchError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::Io(err.to_string())
    }
}
