//! subtitle_tool - Find subtitles for TV shows across several providers
//!
//! This library searches multiple subtitle providers for one show, season,
//! episode and language at once, merges whatever they return into a single
//! ranked list, and can download and extract the chosen subtitles.

mod aggregation;
mod download;
mod editor;
mod query;
mod ranking;
mod settings;
mod subtitle_search;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

// Re-export error types
pub use aggregation::{AggregateError, ProviderFailure};
pub use download::DownloadError;
pub use editor::EditorError;
pub use query::QueryError;
pub use settings::SettingsError;
pub use subtitle_search::SearchError;

pub use aggregation::{ProviderEvent, SearchOutcome, aggregate, merge};
pub use download::{
    IRRELEVANT_EXTENSIONS, download_subtitle, extract_archive, is_relevant_subtitle,
};
pub use editor::open_in_editor;
pub use query::{Language, SearchQuery};
pub use ranking::rank;
pub use settings::Settings;
pub use subtitle_search::{
    OpenSubtitlesProvider, PodnapisiProvider, ProviderId, Subtitle, SubtitleProvider, normalize,
};

/// Progress event emitted during a search
///
/// These events allow library users to track progress and provide feedback
/// while providers are queried.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Search started
    Started {
        show_name: String,
        provider_count: usize,
    },

    /// A provider finished, successfully or not
    Provider(ProviderEvent),

    /// Results were merged and ranked
    Ranked { count: usize },
}

/// Top-level error type for subtitle_tool operations
#[derive(Debug, Error)]
pub enum SubtitleToolError {
    /// Invalid search query
    #[error("{0}")]
    Query(#[from] QueryError),

    /// Invalid settings
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// The search produced no results at all
    #[error("no subtitles found")]
    NoSubtitlesFound,

    /// Error during download or extraction
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// Error while running the editor
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Error while writing JSON output
    #[error("Failed to serialize results: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Searches the given providers and returns their ranked results
///
/// All providers are queried concurrently. Their results are merged in the
/// order of `providers`, sorted by language and cut to the query's limit.
/// Provider failures do not abort the search; they are returned as the
/// outcome's combined error next to whatever the other providers found.
///
/// Progress events are emitted through the provided callback, allowing library
/// users to track progress, display status, or remain silent.
///
/// # Arguments
///
/// * `query` - What to search for
/// * `providers` - Providers to query, in merge order
/// * `deadline` - Optional time limit for the whole search
/// * `progress_callback` - Closure called with progress events
///
/// # Examples
///
/// ```no_run
/// use subtitle_tool::{Language, SearchQuery, Settings, search_subtitles};
///
/// let settings = Settings::default();
/// let client = settings.http_client().unwrap();
/// let providers = settings.providers(&client);
///
/// let query = SearchQuery::new("The Office")
///     .unwrap()
///     .with_season(2)
///     .unwrap()
///     .with_language(Language::Code("en".to_string()))
///     .with_limit(5);
///
/// let outcome = search_subtitles(&query, &providers, settings.search_deadline, |_| {});
/// if let Some(error) = &outcome.error {
///     eprintln!("some providers failed: {}", error);
/// }
/// for subtitle in &outcome.subtitles {
///     println!("{} [{}]", subtitle.title, subtitle.language);
/// }
/// ```
pub fn search_subtitles<F>(
    query: &SearchQuery,
    providers: &[Arc<dyn SubtitleProvider>],
    deadline: Option<Duration>,
    mut progress_callback: F,
) -> SearchOutcome
where
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::Started {
        show_name: query.show_name().to_string(),
        provider_count: providers.len(),
    });

    let outcome = aggregate(query, providers, deadline, |event| {
        progress_callback(ProgressEvent::Provider(event))
    });

    let subtitles = rank(outcome.subtitles, query.limit());

    progress_callback(ProgressEvent::Ranked {
        count: subtitles.len(),
    });

    SearchOutcome {
        subtitles,
        error: outcome.error,
    }
}
