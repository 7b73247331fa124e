//! External editor invocation

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while running the external editor
#[derive(Debug, Error)]
pub enum EditorError {
    /// The editor could not be started
    #[error("Failed to launch editor '{editor}': {source}")]
    LaunchFailed {
        editor: String,
        source: std::io::Error,
    },

    /// The editor exited unsuccessfully
    #[error("Editor '{editor}' failed on {path} with exit code {code:?}")]
    ExitStatus {
        editor: String,
        path: PathBuf,
        code: Option<i32>,
    },
}

/// Opens a file in the given editor and waits for it to exit
///
/// The editor is run as a plain command with the file as its only argument,
/// inheriting the terminal.
pub fn open_in_editor(editor: &str, path: &Path) -> Result<(), EditorError> {
    debug!(editor, path = %path.display(), "opening editor");

    let status = Command::new(editor)
        .arg(path)
        .status()
        .map_err(|e| EditorError::LaunchFailed {
            editor: editor.to_string(),
            source: e,
        })?;

    if !status.success() {
        return Err(EditorError::ExitStatus {
            editor: editor.to_string(),
            path: path.to_path_buf(),
            code: status.code(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_editor_fails_to_launch() {
        let result = open_in_editor(
            "subtitle-tool-editor-that-does-not-exist",
            Path::new("a.srt"),
        );
        assert!(matches!(result, Err(EditorError::LaunchFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_editor_exit_status() {
        assert!(open_in_editor("true", Path::new("a.srt")).is_ok());

        let result = open_in_editor("false", Path::new("a.srt"));
        assert!(matches!(
            result,
            Err(EditorError::ExitStatus { code: Some(1), .. })
        ));
    }
}
