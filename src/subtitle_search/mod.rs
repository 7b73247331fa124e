//! Data structures and traits for subtitle search providers.
//!
//! This module provides the canonical subtitle record every provider maps
//! its results into, as well as the trait for implementing providers.

mod language;
mod opensubtitles;
mod podnapisi;
mod xml;
mod xmlrpc;

pub use language::{ProviderId, normalize};
pub use opensubtitles::OpenSubtitlesProvider;
pub use podnapisi::PodnapisiProvider;

use crate::query::SearchQuery;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a single provider can report for one search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Request to the provider failed
    #[error("Request failed: {0}")]
    RequestError(String),

    /// Provider answered with a non-success HTTP status
    #[error("HTTP {status} {reason}")]
    HttpError { status: u16, reason: String },

    /// Session handshake was rejected
    #[error("Session failed: {0}")]
    SessionError(String),

    /// Failed to parse the provider's response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Provider did not answer before the search deadline
    #[error("Timed out before the search deadline")]
    TimedOut,

    /// Provider worker stopped without reporting a result
    #[error("Search aborted without a result")]
    Aborted,
}

impl SearchError {
    /// Builds an HTTP error from a response status.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        SearchError::HttpError {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        SearchError::RequestError(error.to_string())
    }
}

/// A single subtitle found by a provider.
///
/// Only the download URL is guaranteed; the remaining fields carry whatever
/// the provider supplied and may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtitle {
    /// Title of the subtitle or the release it belongs to
    pub title: String,
    /// Release names the subtitle is synced to
    pub releases: Vec<String>,
    /// Season as returned by the provider
    pub season: String,
    /// Episode as returned by the provider
    pub episode: String,
    /// Language name in the provider's own wording
    pub language: String,
    /// Where the subtitle archive can be downloaded
    pub url: String,
}

/// Trait for subtitle providers that can search one upstream source.
///
/// Implementors own their transport and any session state, so several
/// providers can run side by side on separate threads.
pub trait SubtitleProvider: Send + Sync {
    /// Human readable name used in logs and error reports.
    fn name(&self) -> &str;

    /// Searches the provider for subtitles matching the query.
    ///
    /// # Arguments
    ///
    /// * `query` - The canonical search query
    ///
    /// # Returns
    ///
    /// The provider's results in its own order, or a SearchError if the
    /// session, the request or the response parsing failed
    fn search(&self, query: &SearchQuery) -> Result<Vec<Subtitle>, SearchError>;
}

/// One-shot local HTTP server for exercising providers over a real socket.
#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Client that never routes loopback requests through an environment proxy.
    pub(crate) fn client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap()
    }

    /// Base URL of a port nothing is listening on.
    pub(crate) fn closed_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", address)
    }

    /// Answers a single request with `status` and `body`, returning the base URL.
    pub(crate) fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();

        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };

            // Read the whole request so closing the socket does not reset it
            let mut request = Vec::new();
            let mut buffer = [0u8; 4096];
            loop {
                let read = stream.read(&mut buffer).unwrap_or(0);
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);

                let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let headers = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        });

        format!("http://{}", address)
    }
}
