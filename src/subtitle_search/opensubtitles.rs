//! OpenSubtitles subtitle provider implementation.

use super::language::{ProviderId, normalize};
use super::xmlrpc::{self, Value, XmlRpcError};
use super::{SearchError, Subtitle, SubtitleProvider};
use crate::query::{Language, SearchQuery};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Subtitle provider for the OpenSubtitles XML-RPC API.
///
/// Every search logs in anonymously to obtain a session token, runs
/// `SearchSubtitles` with that token and logs out again.
pub struct OpenSubtitlesProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    user_agent: String,
}

impl OpenSubtitlesProvider {
    /// Creates a provider talking to the given XML-RPC endpoint.
    ///
    /// OpenSubtitles only grants sessions to registered user agents, so the
    /// agent string is sent as part of the login call.
    pub fn new(
        client: reqwest::blocking::Client,
        endpoint: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Performs one XML-RPC call and decodes its return value.
    fn call(&self, method: &str, params: &[Value]) -> Result<Value, SearchError> {
        debug!(method, endpoint = %self.endpoint, "OpenSubtitles XML-RPC call");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/xml")
            .body(xmlrpc::method_call(method, params))
            .send()?;

        if !response.status().is_success() {
            return Err(SearchError::from_status(response.status()));
        }

        let body = response.text()?;

        xmlrpc::parse_response(&body).map_err(|e| match e {
            XmlRpcError::Fault { .. } => SearchError::RequestError(e.to_string()),
            other => SearchError::ParseError(other.to_string()),
        })
    }

    /// Opens an anonymous session and returns its token.
    fn log_in(&self) -> Result<String, SearchError> {
        let response = self
            .call(
                "LogIn",
                &[
                    Value::String(String::new()),
                    Value::String(String::new()),
                    Value::String("en".to_string()),
                    Value::String(self.user_agent.clone()),
                ],
            )
            .map_err(|e| SearchError::SessionError(format!("LogIn failed: {}", e)))?;

        session_token(&response)
    }

    fn log_out(&self, token: &str) {
        if let Err(e) = self.call("LogOut", &[Value::String(token.to_string())]) {
            debug!(error = %e, "OpenSubtitles LogOut failed");
        }
    }

    /// Builds the search criteria struct for `SearchSubtitles`.
    ///
    /// Season and episode are only sent when the query specifies them.
    fn search_criteria(query: &SearchQuery) -> Value {
        let language = match query.language() {
            Language::All => normalize(Language::ALL, ProviderId::OpenSubtitles),
            Language::Code(code) => normalize(code, ProviderId::OpenSubtitles),
        };

        let mut criteria = vec![
            (
                "query".to_string(),
                Value::String(query.show_name().to_string()),
            ),
            ("sublanguageid".to_string(), Value::String(language)),
        ];

        if let Some(season) = query.season() {
            criteria.push(("season".to_string(), Value::String(season.to_string())));
        }
        if let Some(episode) = query.episode() {
            criteria.push(("episode".to_string(), Value::String(episode.to_string())));
        }

        Value::Struct(criteria)
    }

    /// Converts a `SearchSubtitles` response to our Subtitle structure.
    ///
    /// OpenSubtitles answers `data: false` when nothing matched. Records
    /// without a download link are skipped.
    fn convert_results(response: &Value) -> Result<Vec<Subtitle>, SearchError> {
        check_status(response).map_err(SearchError::RequestError)?;

        let records: &[Value] = match response.get("data") {
            Some(Value::Array(records)) => records.as_slice(),
            Some(Value::Bool(false)) | Some(Value::Nil) | None => &[],
            Some(other) => {
                return Err(SearchError::ParseError(format!(
                    "unexpected data field: {:?}",
                    other
                )));
            }
        };

        let text = |record: &Value, key: &str| {
            record.get(key).and_then(Value::as_text).unwrap_or_default()
        };

        let mut subtitles = Vec::with_capacity(records.len());
        for record in records {
            let url = text(record, "ZipDownloadLink");
            if url.is_empty() {
                debug!("Skipping OpenSubtitles record without download link");
                continue;
            }

            let release = text(record, "MovieReleaseName");
            subtitles.push(Subtitle {
                title: release.clone(),
                releases: if release.is_empty() {
                    Vec::new()
                } else {
                    vec![release]
                },
                season: text(record, "SeriesSeason"),
                episode: text(record, "SeriesEpisode"),
                language: text(record, "LanguageName"),
                url,
            });
        }

        Ok(subtitles)
    }
}

/// Checks the `status` member every OpenSubtitles response carries.
fn check_status(response: &Value) -> Result<(), String> {
    match response.get("status").and_then(Value::as_text) {
        Some(status) if status.starts_with("200") => Ok(()),
        Some(status) => Err(format!("OpenSubtitles status: {}", status)),
        None => Err("OpenSubtitles response has no status".to_string()),
    }
}

/// Extracts the session token from a `LogIn` response.
fn session_token(response: &Value) -> Result<String, SearchError> {
    check_status(response).map_err(SearchError::SessionError)?;

    response
        .get("token")
        .and_then(Value::as_text)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| SearchError::SessionError("LogIn returned no token".to_string()))
}

impl SubtitleProvider for OpenSubtitlesProvider {
    fn name(&self) -> &str {
        "OpenSubtitles"
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Subtitle>, SearchError> {
        let token = self.log_in()?;

        let result = self
            .call(
                "SearchSubtitles",
                &[
                    Value::String(token.clone()),
                    Value::Array(vec![Self::search_criteria(query)]),
                ],
            )
            .and_then(|response| Self::convert_results(&response));

        self.log_out(&token);

        result
    }
}
