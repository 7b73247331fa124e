//! Result ranking module

use crate::subtitle_search::Subtitle;

/// Orders subtitles by language and keeps at most `limit` of them.
///
/// The sort is stable, so subtitles sharing a language keep the order in
/// which the providers returned them. A `limit` of 0 keeps every result.
pub fn rank(mut subtitles: Vec<Subtitle>, limit: usize) -> Vec<Subtitle> {
    subtitles.sort_by(|a, b| a.language.cmp(&b.language));

    if limit > 0 {
        subtitles.truncate(limit);
    }

    subtitles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subtitle(title: &str, language: &str) -> Subtitle {
        Subtitle {
            title: title.to_string(),
            releases: Vec::new(),
            season: String::new(),
            episode: String::new(),
            language: language.to_string(),
            url: format!("https://example.com/{}", title),
        }
    }

    fn summary(subtitles: &[Subtitle]) -> Vec<(&str, &str)> {
        subtitles
            .iter()
            .map(|s| (s.language.as_str(), s.title.as_str()))
            .collect()
    }

    #[test]
    fn test_sort_is_stable_for_equal_languages() {
        let ranked = rank(
            vec![subtitle("P", "pl"), subtitle("A", "en"), subtitle("B", "en")],
            0,
        );
        assert_eq!(summary(&ranked), vec![("en", "A"), ("en", "B"), ("pl", "P")]);
    }

    #[test]
    fn test_sort_is_bytewise() {
        let ranked = rank(
            vec![
                subtitle("1", "english"),
                subtitle("2", "English"),
                subtitle("3", ""),
            ],
            0,
        );
        assert_eq!(
            summary(&ranked),
            vec![("", "3"), ("English", "2"), ("english", "1")]
        );
    }

    #[test]
    fn test_truncation() {
        let results = vec![
            subtitle("1", "sv"),
            subtitle("2", "de"),
            subtitle("3", "fr"),
            subtitle("4", "en"),
            subtitle("5", "pl"),
        ];

        let limited = rank(results.clone(), 2);
        assert_eq!(summary(&limited), vec![("de", "2"), ("en", "4")]);

        let unlimited = rank(results, 0);
        assert_eq!(unlimited.len(), 5);
    }

    #[test]
    fn test_limit_larger_than_results() {
        let ranked = rank(vec![subtitle("1", "en"), subtitle("2", "de")], 10);
        assert_eq!(summary(&ranked), vec![("de", "2"), ("en", "1")]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new(), 3).is_empty());
    }
}
