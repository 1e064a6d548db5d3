use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::AcquisitionError;
use super::GenerationError;
use super::GenerationRequest;
use super::GenerationResponse;

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Gemini,
}

impl BackendName {
    pub fn parse(text: String) -> Option<BackendName> {
        return BackendName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify all configurations are available to work with
    /// the backend.
    async fn health_check(&self) -> Result<()>;

    /// Runs a single generation attempt. Retries and timeouts are owned by the
    /// caller, implementations should fail fast and classify what went wrong.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;

#[async_trait]
pub trait PageFetcher {
    /// Returns the raw markup of the page at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String, AcquisitionError>;
}

#[async_trait]
pub trait FrameExporter {
    /// Renders a design frame and returns it as base64 encoded PNG data.
    async fn export_frame(&self, file_key: &str, node_id: &str)
        -> Result<String, AcquisitionError>;
}
