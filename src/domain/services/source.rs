#[cfg(test)]
#[path = "source_test.rs"]
mod tests;

use std::sync::Arc;

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::domain::models::AcquisitionError;
use crate::domain::models::FrameExporter;
use crate::domain::models::OutputMode;
use crate::domain::models::PageFetcher;
use crate::domain::models::Prompt;
use crate::domain::models::PromptPart;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"(?i)^(https?://)?([\w.-]+)\.([a-z]{2,6}\.?)(/[\w.-]*)*/?$").unwrap();
});

static FIGMA_PATTERN: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"figma\.com/(file|design)/([^/]+)/.*?[?&]node-id=([^&]+)").unwrap();
});

/// A design tool frame referenced by a clone link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FigmaFrame {
    pub file_key: String,
    pub node_id: String,
}

impl FigmaFrame {
    /// Recognizes `figma.com/file/<key>/...?node-id=<id>` style links. The
    /// node id is percent decoded.
    pub fn parse(url: &str) -> Option<FigmaFrame> {
        let captures = FIGMA_PATTERN.captures(url.trim())?;
        let file_key = captures.get(2)?.as_str().to_string();
        let raw_node_id = captures.get(3)?.as_str();

        let node_id = match percent_decode_str(raw_node_id).decode_utf8() {
            Ok(decoded) => decoded.to_string(),
            Err(_) => raw_node_id.to_string(),
        };

        return Some(FigmaFrame { file_key, node_id });
    }
}

pub fn is_valid_clone_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return false;
    }

    return URL_PATTERN.is_match(trimmed) || FigmaFrame::parse(trimmed).is_some();
}

/// Text stored on the round, describing what was asked for.
pub fn round_prompt(prompt: &str, clone_url: Option<&str>) -> String {
    if let Some(url) = clone_url {
        if FigmaFrame::parse(url).is_some() {
            return format!("Clone from Figma: {url}\nChange: {prompt}");
        }
        return format!("Clone: {url}\nChange: {prompt}");
    }

    return prompt.to_string();
}

fn refactor_prompt(code: &str) -> String {
    return format!("Please redesign and refactor the following frontend code to be more modern, responsive, and aesthetically pleasing. Here is the code:\n\n```html\n{code}\n```");
}

fn page_clone_prompt(prompt: &str, html: &str) -> String {
    return format!("Based on the following user instruction, refactor the provided HTML code. \n\nUSER INSTRUCTION:\n{prompt}\n\nORIGINAL HTML CODE:\n```html\n{html}\n```");
}

fn figma_clone_prompt(prompt: &str, image: String) -> Prompt {
    return Prompt::Parts(vec![
        PromptPart::InlineImage {
            mime_type: "image/png".to_string(),
            data: image,
        },
        PromptPart::Text(format!("Based on the user instruction, create a single, self-contained, responsive HTML file from the provided Figma design image.\n\nUSER INSTRUCTION:\n{prompt}")),
    ]);
}

/// Resolves the payload a round sends to every one of its outputs.
#[derive(Clone)]
pub struct SourceAcquisition {
    page_fetcher: Arc<dyn PageFetcher + Send + Sync>,
    frame_exporter: Arc<dyn FrameExporter + Send + Sync>,
}

impl SourceAcquisition {
    pub fn new(
        page_fetcher: Arc<dyn PageFetcher + Send + Sync>,
        frame_exporter: Arc<dyn FrameExporter + Send + Sync>,
    ) -> SourceAcquisition {
        return SourceAcquisition {
            page_fetcher,
            frame_exporter,
        };
    }

    /// Builds the generation payload. Clone mode reaches out to the frame
    /// exporter or the page fetcher, which is the only way this can fail.
    pub async fn resolve(
        &self,
        mode: OutputMode,
        prompt: &str,
        clone_url: Option<&str>,
    ) -> Result<Prompt, AcquisitionError> {
        if mode != OutputMode::Clone {
            if mode == OutputMode::Refactor {
                return Ok(Prompt::Text(refactor_prompt(prompt)));
            }
            return Ok(Prompt::Text(prompt.to_string()));
        }

        let url = clone_url.unwrap_or_default().trim();
        if let Some(frame) = FigmaFrame::parse(url) {
            tracing::debug!(
                file_key = frame.file_key.as_str(),
                node_id = frame.node_id.as_str(),
                "Exporting Figma frame"
            );
            let image = self
                .frame_exporter
                .export_frame(&frame.file_key, &frame.node_id)
                .await?;

            return Ok(figma_clone_prompt(prompt, image));
        }

        tracing::debug!(url = url, "Fetching page to clone");
        let html = self.page_fetcher.fetch_page(url).await?;

        return Ok(Prompt::Text(page_clone_prompt(prompt, &html)));
    }
}
