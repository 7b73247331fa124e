//! Language code dialects per provider.
//!
//! Providers disagree on how languages are spelled: OpenSubtitles wants
//! three letter codes, Podnapisi two letter ones. The tables below translate
//! the code given on the command line into the provider's vocabulary.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

/// Identifies a provider whose language vocabulary is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenSubtitles,
    Podnapisi,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::OpenSubtitles => f.write_str("OpenSubtitles"),
            ProviderId::Podnapisi => f.write_str("Podnapisi"),
        }
    }
}

static OPENSUBTITLES_DIALECT: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        HashMap::from([
            ("en", "eng"),
            ("pl", "pol"),
            ("pol", "pol"),
            ("ro", "rum"),
            ("all", "all"),
        ])
    });

static PODNAPISI_DIALECT: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([("eng", "en"), ("pol", "pl"), ("rum", "ro"), ("ron", "ro")])
});

fn dialect(provider: ProviderId) -> &'static HashMap<&'static str, &'static str> {
    match provider {
        ProviderId::OpenSubtitles => &OPENSUBTITLES_DIALECT,
        ProviderId::Podnapisi => &PODNAPISI_DIALECT,
    }
}

/// Translates a language code into the given provider's dialect.
///
/// Codes missing from the provider's table are passed through unchanged;
/// the provider itself decides whether it understands them.
///
/// # Examples
///
/// ```
/// use subtitle_tool::{ProviderId, normalize};
///
/// assert_eq!(normalize("en", ProviderId::OpenSubtitles), "eng");
/// assert_eq!(normalize("xx", ProviderId::OpenSubtitles), "xx");
/// ```
pub fn normalize(code: &str, provider: ProviderId) -> String {
    let code = code.trim();
    match dialect(provider).get(code.to_ascii_lowercase().as_str()) {
        Some(mapped) => (*mapped).to_string(),
        None => {
            debug!(%provider, code, "no dialect entry, passing language code through");
            code.to_string()
        }
    }
}
