//! Fetching a mod source: extract archives, walk the content and build the
//! `Mod` descriptor the installer consumes

use super::settings;
use super::{contains_content_folder, ArchiveFormat, ContentClassifier, ContentKind, Mod};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Everything the installer needs from one source
#[derive(Debug, Clone, Default)]
pub struct FetchedMod {
    /// Mod descriptor with files/dlcs/menus/keys/settings filled in
    pub module: Mod,
    /// Candidate directories (classified folders plus unrecognized ones)
    pub directories: Vec<PathBuf>,
    /// Menu xml fragments to copy into the menu root
    pub xmls: Vec<PathBuf>,
}

/// Produces a [`FetchedMod`] from a source path
pub trait Fetcher {
    /// `scratch` is the extraction directory owned by the current attempt
    fn fetch(&self, source: &Path, scratch: &Path) -> Result<FetchedMod>;
}

/// Fetcher for loose folders and zip/7z/rar archives
#[derive(Default)]
pub struct ArchiveFetcher {
    classifier: ContentClassifier,
}

impl ArchiveFetcher {
    pub fn new(classifier: ContentClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ContentClassifier {
        &self.classifier
    }

    /// Scan an extracted or loose content tree
    pub fn scan(&self, root: &Path, name: &str) -> Result<FetchedMod> {
        let mut fetched = FetchedMod {
            module: Mod::new(name),
            ..Default::default()
        };

        let mut walker = WalkDir::new(root).follow_links(false).into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                match self.classifier.classify_path(path) {
                    ContentKind::Mod => {
                        fetched.module.files.insert(folder_name(path));
                        fetched.directories.push(path.to_path_buf());
                        walker.skip_current_dir();
                    }
                    ContentKind::Dlc => {
                        fetched.module.dlcs.insert(folder_name(path));
                        fetched.directories.push(path.to_path_buf());
                        walker.skip_current_dir();
                    }
                    ContentKind::Unknown => {
                        if entry.depth() > 0 {
                            fetched.directories.push(path.to_path_buf());
                        }
                        if contains_content_folder(path) {
                            walker.skip_current_dir();
                        }
                    }
                }
                continue;
            }

            if entry.file_type().is_file() {
                self.scan_file(root, path, &mut fetched)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
            }
        }

        tracing::info!(
            "Fetched {}: {} mod folder(s), {} dlc(s), {} menu(s)",
            name,
            fetched.module.files.len(),
            fetched.module.dlcs.len(),
            fetched.module.menus.len()
        );
        Ok(fetched)
    }

    fn scan_file(&self, root: &Path, path: &Path, fetched: &mut FetchedMod) -> Result<()> {
        let file_name = folder_name(path);
        let lower = file_name.to_lowercase();
        let module = &mut fetched.module;

        if lower.starts_with("readme") {
            let relative = path.strip_prefix(root).unwrap_or(path);
            module.readmes.push(relative.to_string_lossy().to_string());
            return Ok(());
        }

        if lower.ends_with(".xml") && is_menu_location(path) {
            if lower == "input.xml" {
                let text = read_text(path)?;
                extend_unique(&mut module.xmlkeys, settings::parse_xml_keys(&text));
            } else if !crate::config::PROTECTED_MENUS.contains(&lower.as_str()) {
                module.menus.insert(file_name);
                fetched.xmls.push(path.to_path_buf());
            }
            return Ok(());
        }

        match lower.as_str() {
            "input.settings" => {
                let text = read_text(path)?;
                extend_unique(&mut module.inputsettings, settings::parse_input_bindings(&text));
            }
            "user.settings" | "dx11user.settings" | "dx12user.settings" => {
                let text = read_text(path)?;
                extend_unique(&mut module.usersettings, settings::parse_user_settings(&text));
            }
            _ if lower.ends_with(".txt") => {
                let text = read_text(path)?;
                let keys = settings::parse_xml_keys(&text);
                if !keys.is_empty() {
                    extend_unique(&mut module.xmlkeys, keys);
                } else if settings::looks_like_input_settings(&text) {
                    extend_unique(&mut module.inputsettings, settings::parse_input_bindings(&text));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Fetcher for ArchiveFetcher {
    fn fetch(&self, source: &Path, scratch: &Path) -> Result<FetchedMod> {
        let name = folder_name(source);

        if source.is_dir() {
            return self.scan(source, &name);
        }
        if !source.is_file() {
            bail!("Mod source not found: {}", source.display());
        }
        if ArchiveFormat::from_path(source) == ArchiveFormat::Unknown {
            tracing::debug!("No archive extension on {}, probing magic bytes", name);
        }

        if scratch.exists() {
            std::fs::remove_dir_all(scratch).context("Failed to clear extraction directory")?;
        }
        super::extract_archive(source, scratch)?;
        self.scan(scratch, &name)
    }
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `.../user_config_matrix/pc/<file>.xml`
fn is_menu_location(path: &Path) -> bool {
    let mut parents = path.ancestors().skip(1).map(folder_name);
    matches!(
        (parents.next(), parents.next()),
        (Some(pc), Some(matrix))
            if pc.eq_ignore_ascii_case("pc") && matrix.eq_ignore_ascii_case("user_config_matrix")
    )
}

/// Read a text fragment, tolerating a UTF-8 BOM and invalid bytes
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn extend_unique<T: PartialEq>(target: &mut Vec<T>, items: Vec<T>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
