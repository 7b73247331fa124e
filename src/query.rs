//! Search query module
//!
//! This module provides the provider-agnostic search query that is handed
//! to every subtitle provider during a search.

use std::fmt;
use thiserror::Error;

/// Errors that can occur while building a search query
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// No show name was given
    #[error("name of show is required")]
    MissingShowName,

    /// Season numbers start at 1
    #[error("season must be a positive number, got {0}")]
    InvalidSeason(u32),

    /// Episode numbers start at 1
    #[error("episode must be a positive number, got {0}")]
    InvalidEpisode(u32),

    /// Season and episode were required but not both given
    #[error("make sure to send a parameter for season and episode")]
    MissingEpisode,
}

/// Language filter of a search
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Language {
    /// Search subtitles in every language
    #[default]
    All,
    /// Search subtitles in a single language, as a free-form code (e.g. "en", "pol")
    Code(String),
}

impl Language {
    /// Sentinel accepted on the command line for "all languages"
    pub const ALL: &'static str = "all";

    /// Parses a language argument, mapping the `all` sentinel and empty input to [`Language::All`]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL) {
            Language::All
        } else {
            Language::Code(trimmed.to_string())
        }
    }

    /// Returns the language code, or `None` for [`Language::All`]
    pub fn code(&self) -> Option<&str> {
        match self {
            Language::All => None,
            Language::Code(code) => Some(code),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::All => f.write_str(Self::ALL),
            Language::Code(code) => f.write_str(code),
        }
    }
}

/// A subtitle search for one show, optionally narrowed to a season, episode and language
///
/// A query always carries a non-empty show name; the constructor refuses to
/// build one without it. Season and episode are `None` when unspecified,
/// which providers treat as "do not filter on this".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    show_name: String,
    season: Option<u32>,
    episode: Option<u32>,
    language: Language,
    limit: usize,
}

impl SearchQuery {
    /// Creates a query for the given show, matching all languages without a limit
    pub fn new(show_name: impl Into<String>) -> Result<Self, QueryError> {
        let show_name = show_name.into().trim().to_string();
        if show_name.is_empty() {
            return Err(QueryError::MissingShowName);
        }

        Ok(Self {
            show_name,
            season: None,
            episode: None,
            language: Language::All,
            limit: 0,
        })
    }

    /// Restricts the query to a season (1-based)
    pub fn with_season(mut self, season: u32) -> Result<Self, QueryError> {
        if season == 0 {
            return Err(QueryError::InvalidSeason(season));
        }
        self.season = Some(season);
        Ok(self)
    }

    /// Restricts the query to an episode (1-based)
    pub fn with_episode(mut self, episode: u32) -> Result<Self, QueryError> {
        if episode == 0 {
            return Err(QueryError::InvalidEpisode(episode));
        }
        self.episode = Some(episode);
        Ok(self)
    }

    /// Sets the language filter
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Keeps only the first `limit` ranked results; 0 keeps everything
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Fails unless both season and episode are set
    pub fn require_episode(&self) -> Result<(), QueryError> {
        match (self.season, self.episode) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(QueryError::MissingEpisode),
        }
    }

    pub fn show_name(&self) -> &str {
        &self.show_name
    }

    pub fn season(&self) -> Option<u32> {
        self.season
    }

    pub fn episode(&self) -> Option<u32> {
        self.episode
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_name() {
        assert_eq!(SearchQuery::new(""), Err(QueryError::MissingShowName));
        assert_eq!(SearchQuery::new("   "), Err(QueryError::MissingShowName));
    }

    #[test]
    fn test_new_defaults() {
        let query = SearchQuery::new(" Breaking Bad ").unwrap();
        assert_eq!(query.show_name(), "Breaking Bad");
        assert_eq!(query.season(), None);
        assert_eq!(query.episode(), None);
        assert_eq!(query.language(), &Language::All);
        assert_eq!(query.limit(), 0);
    }

    #[test]
    fn test_zero_season_and_episode_rejected() {
        let query = SearchQuery::new("Show").unwrap();
        assert_eq!(
            query.clone().with_season(0),
            Err(QueryError::InvalidSeason(0))
        );
        assert_eq!(query.with_episode(0), Err(QueryError::InvalidEpisode(0)));
    }

    #[test]
    fn test_require_episode() {
        let query = SearchQuery::new("Show").unwrap().with_season(1).unwrap();
        assert_eq!(query.require_episode(), Err(QueryError::MissingEpisode));

        let query = query.with_episode(2).unwrap();
        assert_eq!(query.require_episode(), Ok(()));
    }

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("all"), Language::All);
        assert_eq!(Language::parse("ALL"), Language::All);
        assert_eq!(Language::parse(""), Language::All);
        assert_eq!(Language::parse(" en "), Language::Code("en".to_string()));
        assert_eq!(Language::parse("pol").code(), Some("pol"));
        assert_eq!(Language::All.code(), None);
    }

    #[test]
    fn test_language_display() {
        assert_eq!(Language::All.to_string(), "all");
        assert_eq!(Language::parse(" pol ").to_string(), "pol");
    }
}
