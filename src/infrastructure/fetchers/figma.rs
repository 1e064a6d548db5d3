#[cfg(test)]
#[path = "figma_test.rs"]
mod tests;

use std::collections::HashMap;

use async_trait::async_trait;
use base64::engine::general_purpose;
use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AcquisitionError;
use crate::domain::models::FrameExporter;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImagesResponse {
    err: Option<String>,
    #[serde(default)]
    images: HashMap<String, Option<String>>,
}

fn export_failed(err: reqwest::Error) -> AcquisitionError {
    return AcquisitionError::FigmaExportFailed(err.to_string());
}

/// Renders Figma frames through the REST images endpoint.
pub struct FigmaFrameExporter {
    url: String,
    token: String,
}

impl Default for FigmaFrameExporter {
    fn default() -> FigmaFrameExporter {
        return FigmaFrameExporter {
            url: Config::get(ConfigKey::FigmaURL),
            token: Config::get(ConfigKey::FigmaToken),
        };
    }
}

#[async_trait]
impl FrameExporter for FigmaFrameExporter {
    #[allow(clippy::implicit_return)]
    async fn export_frame(
        &self,
        file_key: &str,
        node_id: &str,
    ) -> Result<String, AcquisitionError> {
        if self.token.is_empty() {
            return Err(AcquisitionError::FigmaNotConfigured);
        }

        let client = reqwest::Client::new();
        let res = client
            .get(format!(
                "{url}/v1/images/{file_key}",
                url = self.url,
                file_key = file_key
            ))
            .query(&[("ids", node_id), ("format", "png"), ("scale", "2")])
            .header("X-Figma-Token", &self.token)
            .send()
            .await
            .map_err(export_failed)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.json::<ImagesResponse>().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Figma image export failed");
            return Err(AcquisitionError::FigmaExportFailed(format!(
                "Figma API error ({status}): {err}",
                status = status.as_u16(),
                err = body.err.unwrap_or_else(|| return "Failed to get image URL".to_string())
            )));
        }

        let body = res.json::<ImagesResponse>().await.map_err(export_failed)?;
        let image_url = match body.images.get(node_id).cloned().flatten() {
            Some(image_url) => image_url,
            None => return Err(AcquisitionError::FigmaFrameNotFound),
        };

        let image = client.get(&image_url).send().await.map_err(export_failed)?;
        if !image.status().is_success() {
            return Err(AcquisitionError::FigmaExportFailed(format!(
                "Failed to fetch the Figma image from its URL ({}).",
                image.status().as_u16()
            )));
        }

        let bytes = image.bytes().await.map_err(export_failed)?;

        return Ok(general_purpose::STANDARD.encode(bytes));
    }
}
