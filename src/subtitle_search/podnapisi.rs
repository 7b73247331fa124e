//! Podnapisi subtitle provider implementation.

use super::language::{ProviderId, normalize};
use super::xml::{Element, parse_document};
use super::{SearchError, Subtitle, SubtitleProvider};
use crate::query::SearchQuery;
use tracing::debug;

/// Subtitle provider for the Podnapisi XML search endpoint.
///
/// This provider is stateless: each search is a single GET against
/// `/subtitles/search/old` with `sXML=1`.
pub struct PodnapisiProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl PodnapisiProvider {
    /// Creates a Podnapisi provider using the given client and site root.
    pub fn new(client: reqwest::blocking::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Builds the query string parameters for a search.
    ///
    /// Season, episode and language are left out when unspecified so the
    /// site does not filter on them.
    fn query_params(query: &SearchQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![("sK", query.show_name().to_string())];

        if let Some(season) = query.season() {
            params.push(("sTS", season.to_string()));
        }
        if let Some(episode) = query.episode() {
            params.push(("sTE", episode.to_string()));
        }
        if let Some(code) = query.language().code() {
            params.push(("sL", normalize(code, ProviderId::Podnapisi)));
        }

        params.push(("sXML", "1".to_string()));
        params
    }

    /// Converts one `<subtitle>` element to our Subtitle structure.
    fn convert_subtitle(element: &Element) -> Option<Subtitle> {
        let page = element.child_text("url");
        if page.trim().is_empty() {
            return None;
        }

        let releases = element
            .child("releases")
            .map(|releases| {
                releases
                    .children_named("release")
                    .map(|release| release.text.clone())
                    .filter(|release| !release.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(Subtitle {
            title: element.child_text("title"),
            releases,
            season: element.child_text("tvSeason"),
            episode: element.child_text("tvEpisode"),
            language: element.child_text("language"),
            url: format!("{}/download", page.trim().trim_end_matches('/')),
        })
    }

    /// Parses a search results document.
    fn parse_results(body: &str) -> Result<Vec<Subtitle>, SearchError> {
        let document = parse_document(body).map_err(SearchError::ParseError)?;

        let elements = document.descendants_named("subtitle");
        let subtitles: Vec<Subtitle> = elements
            .iter()
            .filter_map(|element| Self::convert_subtitle(element))
            .collect();

        if subtitles.len() < elements.len() {
            debug!(
                skipped = elements.len() - subtitles.len(),
                "Skipping Podnapisi records without download link"
            );
        }

        Ok(subtitles)
    }
}

impl SubtitleProvider for PodnapisiProvider {
    fn name(&self) -> &str {
        "Podnapisi"
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Subtitle>, SearchError> {
        // Build the API URL
        let url = format!("{}/subtitles/search/old", self.base_url);
        let params = Self::query_params(query);

        debug!(%url, ?params, "Podnapisi search request");

        let response = self.client.get(&url).query(&params).send()?;

        // Ensure request was successful
        if !response.status().is_success() {
            return Err(SearchError::from_status(response.status()));
        }

        let body = response.text()?;

        Self::parse_results(&body)
    }
}
