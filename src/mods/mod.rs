//! Mod model - the installed-mod entity and the content/config collaborators
//! the install engine drives

mod archive;
mod classify;
mod conflicts;
mod fetcher;
mod patcher;
pub mod settings;

pub use archive::*;
pub use classify::*;
pub use conflicts::*;
pub use fetcher::*;
pub use patcher::*;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// One of the four config surfaces a mod can patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Menus,
    XmlKeys,
    InputKeys,
    UserSettings,
}

impl Region {
    /// Install order used by the patch runner
    pub const INSTALL_ORDER: [Region; 4] = [
        Region::Menus,
        Region::XmlKeys,
        Region::InputKeys,
        Region::UserSettings,
    ];

    /// Name of the config surface shown to the user
    pub fn surface(&self) -> &'static str {
        match self {
            Region::Menus => "menu xml files",
            Region::XmlKeys => "input.xml",
            Region::InputKeys => "input.settings",
            Region::UserSettings => "user.settings",
        }
    }
}

/// A single input.settings line scoped to its context section
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputBinding {
    pub context: String,
    pub line: String,
}

/// A single user.settings override
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserSetting {
    pub section: String,
    pub key: String,
    pub value: String,
}

/// An installed (or installing) mod
///
/// Two mods are the same installed mod when both `name` and `files` match,
/// see [`Mod::same_identity`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mod {
    /// Source name (final component of the installed path)
    pub name: String,
    /// Install timestamp, `%Y-%m-%d %H:%M:%S` UTC
    pub date: String,
    pub enabled: bool,
    /// Load priority written to mods.settings, if any
    pub priority: Option<i32>,
    /// Hidden from listings
    pub hidden: bool,

    /// Mod folders placed under the mods root
    pub files: BTreeSet<String>,
    /// DLC folders placed under the DLC root
    pub dlcs: BTreeSet<String>,
    /// Menu xml files placed under the menu root
    pub menus: BTreeSet<String>,
    /// `<Var .../>` lines merged into input.xml
    pub xmlkeys: Vec<String>,
    /// Keys this mod actually added to input.xml
    pub applied_xml_keys: Vec<String>,
    pub inputsettings: Vec<InputBinding>,
    pub usersettings: Vec<UserSetting>,
    /// Bindings this mod actually added to input.settings
    pub applied_input_keys: Vec<InputBinding>,
    /// Readme files shipped with the mod
    pub readmes: Vec<String>,
}

impl Mod {
    /// Create an empty, enabled mod
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            ..Default::default()
        }
    }

    /// Registry identity: same name and same set of mod folders
    pub fn same_identity(&self, other: &Mod) -> bool {
        self.name == other.name && self.files == other.files
    }

    /// True when the mod places any data or DLC folder
    pub fn has_content(&self) -> bool {
        !self.files.is_empty() || !self.dlcs.is_empty()
    }

    /// Copy the fields a reinstall refreshes onto an existing entry
    pub fn refresh_from(&mut self, other: &Mod) {
        self.usersettings = other.usersettings.clone();
        self.hidden = other.hidden;
        self.xmlkeys = other.xmlkeys.clone();
        self.dlcs = other.dlcs.clone();
        self.date = other.date.clone();
        self.menus = other.menus.clone();
        self.inputsettings = other.inputsettings.clone();
        // a repeat install skips what the first one added, keep both records
        for binding in &other.applied_input_keys {
            if !self.applied_input_keys.contains(binding) {
                self.applied_input_keys.push(binding.clone());
            }
        }
        for key in &other.applied_xml_keys {
            if !self.applied_xml_keys.contains(key) {
                self.applied_xml_keys.push(key.clone());
            }
        }
        self.readmes = other.readmes.clone();
    }

    /// Display name for a source file or folder name
    ///
    /// Strips archive extensions and the Nexus id/version suffix
    /// ("Foo-1234-1-0-1612345678.zip" -> "Foo").
    pub fn format_name(name: &str) -> String {
        let path = Path::new(name);
        let stem = match ArchiveFormat::from_path(path) {
            ArchiveFormat::Unknown => name,
            _ => path.file_stem().and_then(|s| s.to_str()).unwrap_or(name),
        };

        let stem = match Regex::new(r"^(.+?)(-\d+)+$") {
            Ok(re) => re
                .captures(stem)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
                .unwrap_or(stem),
            Err(_) => stem,
        };

        stem.replace('_', " ").trim().to_string()
    }
}
