//! Runtime settings
//!
//! Endpoints, HTTP behavior and the overall search deadline. The defaults
//! point at the public provider endpoints.

use crate::subtitle_search::{OpenSubtitlesProvider, PodnapisiProvider, SubtitleProvider};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while turning settings into clients
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to build the HTTP client
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings shared by every provider and the downloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// XML-RPC endpoint of OpenSubtitles
    pub opensubtitles_endpoint: String,
    /// Site root of Podnapisi
    pub podnapisi_url: String,
    /// User agent sent with every request and the OpenSubtitles login
    pub user_agent: String,
    /// Time limit for a single HTTP request
    pub request_timeout: Duration,
    /// Time limit for searching all providers; `None` waits for every provider
    pub search_deadline: Option<Duration>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            opensubtitles_endpoint: "https://api.opensubtitles.org/xml-rpc".to_string(),
            podnapisi_url: "https://www.podnapisi.net".to_string(),
            user_agent: format!("subtitle_tool v{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(20),
            search_deadline: Some(Duration::from_secs(30)),
        }
    }
}

impl Settings {
    /// Builds the blocking HTTP client all providers share
    pub fn http_client(&self) -> Result<reqwest::blocking::Client, SettingsError> {
        Ok(reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.request_timeout)
            .build()?)
    }

    /// Creates the providers searched by default, in merge order
    pub fn providers(
        &self,
        client: &reqwest::blocking::Client,
    ) -> Vec<Arc<dyn SubtitleProvider>> {
        vec![
            Arc::new(OpenSubtitlesProvider::new(
                client.clone(),
                &self.opensubtitles_endpoint,
                &self.user_agent,
            )),
            Arc::new(PodnapisiProvider::new(client.clone(), &self.podnapisi_url)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_providers_order() {
        let settings = Settings::default();
        let client = settings.http_client().unwrap();

        let names: Vec<String> = settings
            .providers(&client)
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["OpenSubtitles", "Podnapisi"]);
    }
}
