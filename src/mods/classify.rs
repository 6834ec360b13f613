//! Classification of extracted folders into mod, DLC or unknown content

use regex_lite::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// What an extracted folder represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Mod,
    Dlc,
    Unknown,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Mod => "Mod",
            ContentKind::Dlc => "DLC",
            ContentKind::Unknown => "Unknown",
        }
    }
}

type FolderPredicate = Box<dyn Fn(&str, &str) -> bool + Send + Sync>;

/// Name-pattern based folder classifier
///
/// The mod and DLC predicates receive `(folder_name, parent_folder_name)`.
pub struct ContentClassifier {
    is_mod: FolderPredicate,
    is_dlc: FolderPredicate,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(is_mod_folder, is_dlc_folder)
    }
}

impl ContentClassifier {
    pub fn new<M, D>(is_mod: M, is_dlc: D) -> Self
    where
        M: Fn(&str, &str) -> bool + Send + Sync + 'static,
        D: Fn(&str, &str) -> bool + Send + Sync + 'static,
    {
        Self {
            is_mod: Box::new(is_mod),
            is_dlc: Box::new(is_dlc),
        }
    }

    /// Classify a folder by its name and its parent's name
    pub fn classify(&self, name: &str, parent: &str) -> ContentKind {
        if (self.is_mod)(name, parent) {
            ContentKind::Mod
        } else if (self.is_dlc)(name, parent) {
            ContentKind::Dlc
        } else {
            ContentKind::Unknown
        }
    }

    /// Classify a folder path using its own and its parent's file names
    pub fn classify_path(&self, dir: &Path) -> ContentKind {
        let name = file_name_str(dir);
        let parent = dir.parent().map(file_name_str).unwrap_or_default();
        self.classify(&name, &parent)
    }
}

fn file_name_str(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn mod_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^~?mod.+$").expect("valid mod folder pattern"))
}

/// `modXyz` or disabled `~modXyz`, anywhere but directly under `dlc`
///
/// The `Mods` container folder itself is not a mod.
pub fn is_mod_folder(name: &str, parent: &str) -> bool {
    mod_pattern().is_match(name)
        && !name.eq_ignore_ascii_case("mods")
        && !parent.eq_ignore_ascii_case("dlc")
}

/// Any folder directly under `dlc` that is not itself a structural folder
pub fn is_dlc_folder(name: &str, parent: &str) -> bool {
    parent.eq_ignore_ascii_case("dlc")
        && !["content", "bin", "dlc"]
            .iter()
            .any(|reserved| name.eq_ignore_ascii_case(reserved))
}

/// Whether a directory holds game data (a `content` folder) directly inside it
pub fn contains_content_folder(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(|e| e.ok()).any(|entry| {
                entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
                    && entry.file_name().to_string_lossy().eq_ignore_ascii_case("content")
            })
        })
        .unwrap_or(false)
}
