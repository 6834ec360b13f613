//! Where w3modman keeps its config, registry and scratch files

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application folders resolved from the XDG base directories
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directories from XDG
    dirs: ProjectDirs,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    /// Create a new Paths instance
    pub fn new() -> Self {
        let dirs = ProjectDirs::from("", "", "w3modman")
            .expect("Failed to determine project directories");
        Self { dirs }
    }

    /// Config directory: ~/.config/w3modman/
    pub fn config_dir(&self) -> PathBuf {
        self.dirs.config_dir().to_path_buf()
    }

    /// Main config file: ~/.config/w3modman/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Data directory: ~/.local/share/w3modman/
    pub fn data_dir(&self) -> PathBuf {
        self.dirs.data_dir().to_path_buf()
    }

    /// Installed-mod registry: ~/.local/share/w3modman/w3modman.db
    pub fn database_file(&self) -> PathBuf {
        self.data_dir().join("w3modman.db")
    }

    /// Cache directory: ~/.cache/w3modman/
    pub fn cache_dir(&self) -> PathBuf {
        self.dirs.cache_dir().to_path_buf()
    }

    /// Archive extraction scratch: ~/.cache/w3modman/extracted/
    pub fn extract_dir(&self) -> PathBuf {
        self.cache_dir().join("extracted")
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.cache_dir())?;
        Ok(())
    }
}
