//! Subtitle download and extraction
//!
//! Subtitles are distributed as zip archives. This module fetches an
//! archive and writes the subtitle files it contains to a directory.

use crate::subtitle_search::Subtitle;
use humansize::{DECIMAL, format_size};
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while downloading or extracting a subtitle
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Failed to fetch the archive
    #[error("Failed to download subtitle from {url}: {source}")]
    RequestFailed { url: String, source: reqwest::Error },

    /// Server answered with a non-success status
    #[error("HTTP {status} while downloading subtitle from {url}")]
    HttpError { url: String, status: u16 },

    /// The download is not a readable zip archive
    #[error("Failed to read subtitle archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The archive held nothing but irrelevant files
    #[error("no relevant files in the archive")]
    NoRelevantFiles,

    /// Failed to write an extracted file
    #[error("Failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// File extensions that never contain subtitles (release notes and the like)
pub const IRRELEVANT_EXTENSIONS: &[&str] = &[".nfo"];

/// Returns true unless the file name ends with an irrelevant extension
pub fn is_relevant_subtitle(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    !IRRELEVANT_EXTENSIONS
        .iter()
        .any(|extension| lower.ends_with(extension))
}

/// Downloads a subtitle archive and extracts it into `output_dir`
///
/// # Returns
///
/// The path of the last subtitle file written
pub fn download_subtitle(
    client: &reqwest::blocking::Client,
    subtitle: &Subtitle,
    output_dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let url = subtitle.url.as_str();
    debug!(%url, "downloading subtitle archive");

    let response = client
        .get(url)
        .send()
        .map_err(|e| DownloadError::RequestFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpError {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let bytes = response.bytes().map_err(|e| DownloadError::RequestFailed {
        url: url.to_string(),
        source: e,
    })?;

    info!(
        %url,
        size = %format_size(bytes.len(), DECIMAL),
        "downloaded subtitle archive"
    );

    extract_archive(&bytes, output_dir)
}

/// Extracts the relevant files of a zip archive into `output_dir`
///
/// Directories, irrelevant files and entries whose path would leave
/// `output_dir` are skipped. The output directory is created if needed.
///
/// # Returns
///
/// The path of the last file written, or [`DownloadError::NoRelevantFiles`]
/// if nothing was extracted
pub fn extract_archive(bytes: &[u8], output_dir: &Path) -> Result<PathBuf, DownloadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut last_written = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;

        if entry.is_dir() || !is_relevant_subtitle(entry.name()) {
            debug!(name = entry.name(), "skipping archive entry");
            continue;
        }

        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            debug!(name = entry.name(), "skipping archive entry outside output directory");
            continue;
        };

        let destination = output_dir.join(relative);
        debug!(path = %destination.display(), "extracting subtitle");

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::WriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = File::create(&destination).map_err(|e| DownloadError::WriteFailed {
            path: destination.clone(),
            source: e,
        })?;
        io::copy(&mut entry, &mut file).map_err(|e| DownloadError::WriteFailed {
            path: destination.clone(),
            source: e,
        })?;

        last_written = Some(destination);
    }

    last_written.ok_or(DownloadError::NoRelevantFiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut out);
            for (name, content) in entries {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        out.into_inner()
    }

    #[test]
    fn test_is_relevant_subtitle() {
        assert!(is_relevant_subtitle("Show.S01E02.srt"));
        assert!(is_relevant_subtitle("Show.S01E02.sub"));
        assert!(!is_relevant_subtitle("release.nfo"));
        assert!(!is_relevant_subtitle("RELEASE.NFO"));
    }

    #[test]
    fn test_extract_skips_irrelevant_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_zip(&[
            ("Show.S01E02.srt", "1\n00:00:01,000 --> 00:00:02,000\nHello\n"),
            ("info.nfo", "ripped by someone"),
        ]);

        let written = extract_archive(&archive, dir.path()).unwrap();

        assert_eq!(written, dir.path().join("Show.S01E02.srt"));
        assert!(fs::read_to_string(&written).unwrap().contains("Hello"));
        assert!(!dir.path().join("info.nfo").exists());
    }

    #[test]
    fn test_extract_returns_last_relevant_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_zip(&[
            ("first.srt", "a"),
            ("nested/second.srt", "b"),
            ("notes.nfo", "c"),
        ]);

        let written = extract_archive(&archive, dir.path()).unwrap();

        assert_eq!(written, dir.path().join("nested").join("second.srt"));
        assert!(dir.path().join("first.srt").exists());
    }

    #[test]
    fn test_extract_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("subs");
        let archive = build_zip(&[("a.srt", "a")]);

        let written = extract_archive(&archive, &output).unwrap();
        assert_eq!(written, output.join("a.srt"));
    }

    #[test]
    fn test_extract_without_relevant_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_zip(&[("only.nfo", "nothing here")]);

        assert!(matches!(
            extract_archive(&archive, dir.path()),
            Err(DownloadError::NoRelevantFiles)
        ));
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            extract_archive(b"<html>not a zip</html>", dir.path()),
            Err(DownloadError::Archive(_))
        ));
    }
}
