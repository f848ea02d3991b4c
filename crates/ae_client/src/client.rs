use std::time::Duration;

use ae_core::envelope::ListResponse;
use ae_core::ListParams;
use tracing::{debug, warn};
use url::Url;

use crate::state::{ViewEvent, ViewState};
use crate::FetchError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads articles from the HTTP API.
#[derive(Debug, Clone)]
pub struct ArticleClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ArticleClient {
    /// `base_url` is where the API is mounted, e.g. `http://localhost:5000`
    /// or `http://host/proxy`.
    pub fn new(mut base_url: Url) -> Self {
        // `join` replaces the last segment unless the path ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { http, base_url }
    }

    pub fn articles_url(&self) -> Result<Url, FetchError> {
        Ok(self.base_url.join("api/articles")?)
    }

    /// Fetches every article, original and updated alike. The body has to
    /// match the list envelope exactly.
    pub async fn fetch_articles(&self) -> Result<ListResponse, FetchError> {
        let url = self.articles_url()?;
        debug!("🔍 Fetching articles from {}", url);

        let response = self
            .http
            .get(url)
            .query(&ListParams::include_all())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ Article fetch failed with status {}", status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let body: ListResponse =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))?;
        if !body.success {
            return Err(FetchError::Rejected("The server reported a failure".to_string()));
        }

        debug!("📚 Received {} of {} articles", body.count, body.total);
        Ok(body)
    }

    /// Runs one fetch cycle through the view state machine.
    pub async fn refresh(&self, state: ViewState) -> ViewState {
        if state.is_loading() {
            return state;
        }
        let state = state.transition(ViewEvent::Fetch);
        let event = ViewEvent::from_fetch(self.fetch_articles().await);
        state.transition(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_articles_url() {
        let client = ArticleClient::new(Url::parse("http://localhost:5000").unwrap());
        assert_eq!(
            client.articles_url().unwrap().as_str(),
            "http://localhost:5000/api/articles"
        );
    }

    #[test]
    fn test_articles_url_keeps_path_prefix() {
        for base in ["http://host/proxy", "http://host/proxy/"] {
            let client = ArticleClient::new(Url::parse(base).unwrap());
            assert_eq!(
                client.articles_url().unwrap().as_str(),
                "http://host/proxy/api/articles"
            );
        }
    }
}
