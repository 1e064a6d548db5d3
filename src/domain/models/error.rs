#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use std::time::Duration;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use thiserror::Error;

use super::OutputMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Timeout,
    Safety,
    Auth,
    Network,
    MalformedResponse,
    Unknown,
    FigmaExportFailed,
    PageFetchFailed,
}

impl ErrorKind {
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => return "Request timed out",
            ErrorKind::Safety => return "Blocked by safety filters",
            ErrorKind::Auth => return "Authentication failed",
            ErrorKind::Network => return "Network error",
            ErrorKind::MalformedResponse => return "Invalid response",
            ErrorKind::Unknown => return "Response error",
            ErrorKind::FigmaExportFailed => return "Figma export failed",
            ErrorKind::PageFetchFailed => return "Could not fetch page",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => {
                return "The model took too long to answer. Try a shorter prompt or a model with thinking turned off."
            }
            ErrorKind::Safety => {
                return "The prompt or the generated content tripped a content policy. Rephrase the prompt and try again."
            }
            ErrorKind::Auth => {
                return "Check that gemini-token is set to a valid API key for the configured backend."
            }
            ErrorKind::Network => {
                return "The backend could not be reached. Check your connection and the configured URL."
            }
            ErrorKind::MalformedResponse => {
                return "The backend answered without any generated text. Running the round again usually helps."
            }
            ErrorKind::Unknown => return "Something unexpected went wrong. Try again in a moment.",
            ErrorKind::FigmaExportFailed => {
                return "Make sure figma-token is set and the link points at a specific frame (node-id)."
            }
            ErrorKind::PageFetchFailed => {
                return "Make sure the URL is publicly reachable. Some sites refuse to be fetched through a proxy."
            }
        }
    }

    pub fn details(&self) -> ErrorDetails {
        return ErrorDetails {
            kind: *self,
            title: self.title().to_string(),
            suggestion: self.suggestion().to_string(),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub title: String,
    pub suggestion: String,
}

/// Failure of a single attempt against a generation backend.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Response was blocked: {0}")]
    Safety(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Backend is not reachable: {0}")]
    Network(String),
    #[error("Invalid response from backend: {0}")]
    MalformedResponse(String),
    #[error("{0}")]
    Unknown(String),
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Timeout(_) => return ErrorKind::Timeout,
            GenerationError::Safety(_) => return ErrorKind::Safety,
            GenerationError::Auth(_) => return ErrorKind::Auth,
            GenerationError::Network(_) => return ErrorKind::Network,
            GenerationError::MalformedResponse(_) => return ErrorKind::MalformedResponse,
            GenerationError::Unknown(_) => return ErrorKind::Unknown,
        }
    }

    /// Auth and safety failures answer the same way every time, everything
    /// else may go away on its own.
    pub fn is_retryable(&self) -> bool {
        return !matches!(
            self,
            GenerationError::Auth(_) | GenerationError::Safety(_)
        );
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> GenerationError {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return GenerationError::Network(err.to_string());
        }
        if err.is_decode() {
            return GenerationError::MalformedResponse(err.to_string());
        }

        return GenerationError::Unknown(err.to_string());
    }
}

/// What a generation caller gets back once retries are exhausted or a fatal
/// error was hit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    pub details: ErrorDetails,
    pub message: String,
    pub attempts: u32,
}

impl ClassifiedError {
    pub fn new(err: &GenerationError, attempts: u32) -> ClassifiedError {
        return ClassifiedError {
            details: err.kind().details(),
            message: err.to_string(),
            attempts,
        };
    }

    pub fn kind(&self) -> ErrorKind {
        return self.details.kind;
    }
}

/// Failure to resolve the shared source of a round before generation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error("This app is not configured to use the Figma API. A figma-token is missing.")]
    FigmaNotConfigured,
    #[error("Could not find the specified frame (node-id) in the Figma file. Please make sure the link points to a specific frame.")]
    FigmaFrameNotFound,
    #[error("{0}")]
    FigmaExportFailed(String),
    #[error("{0}")]
    PageFetchFailed(String),
}

impl AcquisitionError {
    pub fn kind(&self) -> ErrorKind {
        if let AcquisitionError::PageFetchFailed(_) = self {
            return ErrorKind::PageFetchFailed;
        }

        return ErrorKind::FigmaExportFailed;
    }
}

/// Rejections raised before a round is created.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("{}", .0.empty_prompt_message())]
    EmptyPrompt(OutputMode),
    #[error("Please enter a URL to clone or a Figma link.")]
    MissingCloneUrl,
    #[error("Please enter a valid URL or Figma link.")]
    InvalidCloneUrl,
    #[error("Batch size must be between 1 and {max}, got {size}.")]
    BatchSize { size: usize, max: usize },
    #[error("Temperature must be between 0.0 and 1.0, got {0}.")]
    Temperature(f32),
}
