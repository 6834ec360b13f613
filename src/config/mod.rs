//! Configuration management for w3modman
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/w3modman/config.toml
//! - Data: ~/.local/share/w3modman/
//! - Cache: ~/.cache/w3modman/

mod paths;

pub use paths::Paths;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Game-default menu and config files that uninstall never deletes
pub const PROTECTED_MENUS: &[&str] = &[
    "audio.xml",
    "display.xml",
    "dx11filelist.txt",
    "dx12filelist.txt",
    "gameplay.xml",
    "gamma.xml",
    "graphics.xml",
    "graphicsdx11.xml",
    "hidden.xml",
    "hud.xml",
    "input.xml",
    "localization.xml",
    "postprocess.xml",
    "rendering.xml",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Game installation directory (the one holding `bin/` and `content/`)
    pub game_path: Option<String>,

    /// Directory holding input.settings / user.settings
    /// (defaults to ~/Documents/The Witcher 3)
    pub settings_dir: Option<String>,

    /// Override for the mods root (defaults to <game>/mods)
    pub mods_dir_override: Option<String>,

    /// Override for the DLC root (defaults to <game>/dlc)
    pub dlc_dir_override: Option<String>,

    /// Override for the menu root
    /// (defaults to <game>/bin/config/r4game/user_config_matrix/pc)
    pub menu_dir_override: Option<String>,

    /// Additional menu file names that must never be removed
    pub extra_protected_menus: Vec<String>,

    /// Ask before overwriting already installed folders
    pub confirm_overwrite: bool,

    /// Paths configuration
    #[serde(skip)]
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_path: None,
            settings_dir: None,
            mods_dir_override: None,
            dlc_dir_override: None,
            menu_dir_override: None,
            extra_protected_menus: Vec::new(),
            confirm_overwrite: true,
            paths: Paths::new(),
        }
    }
}

/// Resolved locations the install engine works against
#[derive(Debug, Clone)]
pub struct InstallPaths {
    /// Game installation root, if configured
    pub game: Option<PathBuf>,
    /// Mods root; `None` when it does not exist and could not be created
    pub mods: Option<PathBuf>,
    /// DLC root; `None` when it does not exist and could not be created
    pub dlc: Option<PathBuf>,
    /// Menu root; `None` when it does not exist and could not be created
    pub menu: Option<PathBuf>,
    /// Directory holding input.settings, user.settings and mods.settings
    pub settings: PathBuf,
    /// Scratch directory archives are extracted into
    pub extracted: PathBuf,
    /// Lower-cased menu file names that are never deleted
    pub protected_menus: BTreeSet<String>,
}

impl InstallPaths {
    /// Build paths rooted at a game directory, creating the mods/DLC/menu roots
    pub fn for_game(game: &Path, settings: &Path, extracted: &Path) -> Self {
        Self {
            game: Some(game.to_path_buf()),
            mods: ensure_dir(game.join("mods")),
            dlc: ensure_dir(game.join("dlc")),
            menu: ensure_dir(default_menu_dir(game)),
            settings: settings.to_path_buf(),
            extracted: extracted.to_path_buf(),
            protected_menus: default_protected_menus(),
        }
    }

    /// Whether a menu file name is one of the protected game files
    pub fn is_protected_menu(&self, name: &str) -> bool {
        self.protected_menus.contains(&name.to_lowercase())
    }
}

fn default_protected_menus() -> BTreeSet<String> {
    PROTECTED_MENUS.iter().map(|m| m.to_string()).collect()
}

fn default_menu_dir(game: &Path) -> PathBuf {
    game.join("bin")
        .join("config")
        .join("r4game")
        .join("user_config_matrix")
        .join("pc")
}

/// Return the directory if it exists or can be created
fn ensure_dir(path: PathBuf) -> Option<PathBuf> {
    if path.is_dir() {
        return Some(path);
    }
    match std::fs::create_dir_all(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!("Could not create {}: {}", path.display(), e);
            None
        }
    }
}

impl Config {
    /// Resolve the settings directory (configured or ~/Documents/The Witcher 3)
    pub fn settings_dir(&self) -> PathBuf {
        self.settings_dir
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| {
                directories::UserDirs::new()
                    .and_then(|dirs| dirs.document_dir().map(|d| d.join("The Witcher 3")))
            })
            .unwrap_or_else(|| self.paths.data_dir().join("settings"))
    }

    /// Resolve every location the installer needs
    ///
    /// Missing roots are created once; a root that cannot be created is `None`.
    pub fn install_paths(&self) -> InstallPaths {
        let game = self.game_path.as_deref().map(PathBuf::from);

        let resolve = |override_dir: &Option<String>, default: Option<PathBuf>| {
            override_dir
                .as_deref()
                .map(PathBuf::from)
                .or(default)
                .and_then(ensure_dir)
        };

        let mut protected_menus = default_protected_menus();
        protected_menus.extend(self.extra_protected_menus.iter().map(|m| m.to_lowercase()));

        InstallPaths {
            mods: resolve(&self.mods_dir_override, game.as_ref().map(|g| g.join("mods"))),
            dlc: resolve(&self.dlc_dir_override, game.as_ref().map(|g| g.join("dlc"))),
            menu: resolve(&self.menu_dir_override, game.as_deref().map(default_menu_dir)),
            game,
            settings: self.settings_dir(),
            extracted: self.paths.extract_dir(),
            protected_menus,
        }
    }

    /// Ensure application directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        self.paths
            .ensure_dirs()
            .context("Failed to create default application directories")
    }

    /// Load configuration from disk or create default
    pub async fn load() -> Result<Self> {
        let paths = Paths::new();
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config::default();
            config.save().await?;
            config
        };

        config.paths = paths;
        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self) -> Result<()> {
        let config_path = self.paths.config_file();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .await
            .context("Failed to write config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_paths_default_to_game_layout() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config {
            game_path: Some(tmp.path().to_string_lossy().to_string()),
            settings_dir: Some(tmp.path().join("settings").to_string_lossy().to_string()),
            extra_protected_menus: vec!["MyShared.XML".to_string()],
            ..Config::default()
        };

        let paths = config.install_paths();
        assert_eq!(paths.mods, Some(tmp.path().join("mods")));
        assert_eq!(paths.dlc, Some(tmp.path().join("dlc")));
        assert_eq!(paths.menu, Some(default_menu_dir(tmp.path())));
        assert!(tmp.path().join("mods").is_dir());
        assert!(paths.is_protected_menu("Input.xml"));
        assert!(paths.is_protected_menu("myshared.xml"));
        assert!(!paths.is_protected_menu("modFoo.xml"));
    }

    #[test]
    fn install_paths_without_game_have_no_roots() {
        let config = Config::default();
        let paths = config.install_paths();
        assert!(paths.game.is_none());
        assert!(paths.mods.is_none());
        assert!(paths.dlc.is_none());
        assert!(paths.menu.is_none());
    }

    #[test]
    fn uncreatable_root_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        assert_eq!(ensure_dir(blocker.join("mods")), None);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config {
            game_path: Some("/games/witcher3".to_string()),
            confirm_overwrite: false,
            ..Config::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.game_path.as_deref(), Some("/games/witcher3"));
        assert!(!parsed.confirm_overwrite);
    }
}
