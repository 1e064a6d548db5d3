#[cfg(test)]
#[path = "proxy_test.rs"]
mod tests;

use async_trait::async_trait;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AcquisitionError;
use crate::domain::models::PageFetcher;

/// Fetches arbitrary pages through an allorigins style `raw` proxy, which
/// returns the target's body untouched.
pub struct ProxyPageFetcher {
    url: String,
}

impl Default for ProxyPageFetcher {
    fn default() -> ProxyPageFetcher {
        return ProxyPageFetcher {
            url: Config::get(ConfigKey::ProxyURL),
        };
    }
}

#[async_trait]
impl PageFetcher for ProxyPageFetcher {
    #[allow(clippy::implicit_return)]
    async fn fetch_page(&self, url: &str) -> Result<String, AcquisitionError> {
        let res = reqwest::Client::new()
            .get(format!("{proxy}/raw", proxy = self.url))
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|err| return AcquisitionError::PageFetchFailed(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), url = url, "Proxy failed to fetch page");
            return Err(AcquisitionError::PageFetchFailed(format!(
                "Network response was not ok: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        return res
            .text()
            .await
            .map_err(|err| return AcquisitionError::PageFetchFailed(err.to_string()));
    }
}
