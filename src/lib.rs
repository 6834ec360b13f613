//! w3modman - a command-line mod manager for The Witcher 3
//!
//! Installs mods from archives or folders into the game's `mods` and `dlc`
//! folders, merges their menu, input and settings additions, and keeps a
//! registry so mods can be uninstalled, reinstalled, enabled and disabled.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod installer;
pub mod model;
pub mod mods;

pub use app::App;
pub use config::Config;
