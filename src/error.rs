//! Error types shared by the install engine

use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a whole install attempt
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("Mods folder does not exist and could not be created.")]
    ModsFolderUnavailable,

    #[error("DLC folder does not exist and could not be created.")]
    DlcFolderUnavailable,

    #[error("Menu folder does not exist and could not be created.")]
    MenuFolderUnavailable,

    #[error("No data found in '{0}'")]
    NoDataFound(String),

    #[error("'{}' is inside the game folder '{}', install it from somewhere else", .path.display(), .game.display())]
    SourceInsideGame { path: PathBuf, game: PathBuf },
}

/// Failures of a single config region (menus, xml keys, input keys, user settings)
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Could not parse {file}: {reason}")]
    Malformed { file: String, reason: String },

    #[error("{0} folder is not configured")]
    RootUnavailable(&'static str),
}

/// Turn any error chain into a single user-facing line
pub fn format_user_error<E>(err: E) -> String
where
    E: Into<anyhow::Error>,
{
    let err: anyhow::Error = err.into();
    format!("Error: {:#}", err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn format_user_error_includes_context_chain() {
        let err = std::fs::read("/definitely/not/here")
            .context("Failed to read input.settings")
            .unwrap_err();
        let line = format_user_error(err);
        assert!(line.starts_with("Error: Failed to read input.settings: "));
    }

    #[test]
    fn format_user_error_accepts_typed_errors() {
        let line = format_user_error(InstallError::NoDataFound("modFoo.zip".to_string()));
        assert_eq!(line, "Error: No data found in 'modFoo.zip'");

        let line = format_user_error(PatchError::RootUnavailable("Menu"));
        assert_eq!(line, "Error: Menu folder is not configured");
    }
}
