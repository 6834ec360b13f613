//! Config region patching: menus, input.xml keys, input.settings bindings,
//! user.settings overrides, plus enable/disable of installed mods

use super::settings::{self, SettingsDocument};
use super::{Mod, Region};
use crate::config::InstallPaths;
use crate::error::PatchError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const FILELISTS: [&str; 2] = ["dx11filelist.txt", "dx12filelist.txt"];

/// Applies and reverses a mod's config regions
///
/// Every region operation is independently failable. Implementations record
/// whatever they need on the `Mod` to reverse the change later.
pub trait ModPatcher {
    fn install_menus(&self, m: &mut Mod) -> Result<(), PatchError>;
    fn uninstall_menus(&self, m: &mut Mod) -> Result<(), PatchError>;

    fn install_xml_keys(&self, m: &mut Mod) -> Result<(), PatchError>;
    fn uninstall_xml_keys(&self, m: &mut Mod) -> Result<(), PatchError>;

    /// Returns `(added, skipped)` binding counts
    fn install_input_keys(&self, m: &mut Mod) -> Result<(usize, usize), PatchError>;
    fn uninstall_input_keys(&self, m: &mut Mod) -> Result<(), PatchError>;

    fn install_user_settings(&self, m: &mut Mod) -> Result<(), PatchError>;
    fn uninstall_user_settings(&self, m: &mut Mod) -> Result<(), PatchError>;

    /// Sync the mod's load priority; failures are only logged
    ///
    /// A mod without a priority adopts the one already on record for its
    /// folders, if any.
    fn check_priority(&self, m: &mut Mod);

    /// Re-activate a disabled mod; returns the regions that could not be re-applied
    fn enable(&self, m: &mut Mod) -> Result<Vec<Region>, PatchError>;

    /// Deactivate a mod, reversing its regions
    fn disable(&self, m: &mut Mod) -> Result<(), PatchError>;
}

/// [`ModPatcher`] working on the game's real config files
pub struct GamePatcher {
    paths: InstallPaths,
}

impl GamePatcher {
    pub fn new(paths: InstallPaths) -> Self {
        Self { paths }
    }

    fn menu_root(&self) -> Result<&Path, PatchError> {
        self.paths
            .menu
            .as_deref()
            .ok_or(PatchError::RootUnavailable("Menu"))
    }

    fn input_xml(&self) -> Result<PathBuf, PatchError> {
        Ok(self.menu_root()?.join("input.xml"))
    }

    fn input_settings(&self) -> PathBuf {
        self.paths.settings.join("input.settings")
    }

    fn user_settings(&self) -> PathBuf {
        self.paths.settings.join("user.settings")
    }

    fn mods_settings(&self) -> PathBuf {
        self.paths.settings.join("mods.settings")
    }

    /// Existing dx11/dx12 file lists
    fn filelists(&self) -> Result<Vec<PathBuf>, PatchError> {
        let root = self.menu_root()?;
        Ok(FILELISTS
            .iter()
            .map(|name| root.join(name))
            .filter(|path| path.is_file())
            .collect())
    }

    /// Menu names this mod registers, leaving out protected game files
    fn registrable_menus<'a>(&self, m: &'a Mod) -> Vec<&'a str> {
        m.menus
            .iter()
            .filter(|menu| !self.paths.is_protected_menu(menu))
            .map(|menu| menu.as_str())
            .collect()
    }

    /// Rename data/DLC folders between `name` and `~name`
    fn rename_folders(&self, m: &Mod, enable: bool) -> Result<(), PatchError> {
        let roots = [
            (self.paths.mods.as_deref(), &m.files),
            (self.paths.dlc.as_deref(), &m.dlcs),
        ];
        for (root, names) in roots {
            let Some(root) = root else {
                continue;
            };
            for name in names {
                let active = root.join(name);
                let disabled = root.join(format!("~{}", name));
                let (from, to) = if enable {
                    (disabled, active)
                } else {
                    (active, disabled)
                };
                if from.exists() && !to.exists() {
                    tracing::debug!("Renaming {} -> {}", from.display(), to.display());
                    std::fs::rename(&from, &to)?;
                }
            }
        }
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<String, PatchError> {
    if !path.is_file() {
        return Err(PatchError::MissingFile(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn malformed(file: &str, reason: impl Into<String>) -> PatchError {
    PatchError::Malformed {
        file: file.to_string(),
        reason: reason.into(),
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

impl ModPatcher for GamePatcher {
    fn install_menus(&self, m: &mut Mod) -> Result<(), PatchError> {
        let menus = self.registrable_menus(m);
        if menus.is_empty() {
            return Ok(());
        }

        let filelists = self.filelists()?;
        if filelists.is_empty() {
            return Err(PatchError::MissingFile(self.menu_root()?.join(FILELISTS[0])));
        }

        for filelist in filelists {
            let mut lines: Vec<String> = read_existing(&filelist)?
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect();
            for menu in &menus {
                let entry = format!("{};", menu);
                if !lines.iter().any(|l| l.trim().eq_ignore_ascii_case(&entry)) {
                    lines.push(entry);
                }
            }
            std::fs::write(&filelist, join_lines(&lines))?;
        }

        tracing::debug!("Registered {} menu(s) for {}", menus.len(), m.name);
        Ok(())
    }

    fn uninstall_menus(&self, m: &mut Mod) -> Result<(), PatchError> {
        let menus = self.registrable_menus(m);
        if menus.is_empty() || self.paths.menu.is_none() {
            return Ok(());
        }

        for filelist in self.filelists()? {
            let entries: Vec<String> = menus.iter().map(|menu| format!("{};", menu)).collect();
            let lines: Vec<String> = read_existing(&filelist)?
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .filter(|l| !entries.iter().any(|e| l.trim().eq_ignore_ascii_case(e)))
                .collect();
            std::fs::write(&filelist, join_lines(&lines))?;
        }
        Ok(())
    }

    fn install_xml_keys(&self, m: &mut Mod) -> Result<(), PatchError> {
        if m.xmlkeys.is_empty() {
            return Ok(());
        }

        let path = self.input_xml()?;
        let mut lines: Vec<String> = read_existing(&path)?
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        let mut known_ids = HashSet::new();
        for line in lines.iter().filter(|l| l.trim_start().starts_with("<Var")) {
            if let Ok(Some(id)) = settings::var_id(line.trim()) {
                known_ids.insert(id);
            }
        }

        let mut additions = Vec::new();
        for key in &m.xmlkeys {
            let id = settings::var_id(key)
                .map_err(|e| malformed("input.xml key", e))?
                .ok_or_else(|| malformed("input.xml key", format!("missing id in {}", key)))?;
            if known_ids.insert(id) {
                additions.push(key.clone());
                if !m.applied_xml_keys.contains(key) {
                    m.applied_xml_keys.push(key.clone());
                }
            }
        }
        if additions.is_empty() {
            return Ok(());
        }

        let close = lines
            .iter()
            .rposition(|l| l.contains("</VisibleVars>"))
            .ok_or_else(|| malformed("input.xml", "missing </VisibleVars>"))?;
        let indent: String = lines[..close]
            .iter()
            .rev()
            .find(|l| l.trim_start().starts_with("<Var"))
            .map(|l| l.chars().take_while(|c| c.is_whitespace()).collect())
            .unwrap_or_else(|| "\t\t".to_string());

        for (offset, key) in additions.iter().enumerate() {
            lines.insert(close + offset, format!("{}{}", indent, key));
        }
        std::fs::write(&path, join_lines(&lines))?;
        tracing::debug!("Added {} input.xml key(s) for {}", additions.len(), m.name);
        Ok(())
    }

    fn uninstall_xml_keys(&self, m: &mut Mod) -> Result<(), PatchError> {
        if m.applied_xml_keys.is_empty() {
            return Ok(());
        }
        let Some(root) = self.paths.menu.as_deref() else {
            return Ok(());
        };
        let path = root.join("input.xml");
        if path.is_file() {
            let lines: Vec<String> = read_existing(&path)?
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .filter(|l| !m.applied_xml_keys.iter().any(|k| k.trim() == l.trim()))
                .collect();
            std::fs::write(&path, join_lines(&lines))?;
        }
        m.applied_xml_keys.clear();
        Ok(())
    }

    fn install_input_keys(&self, m: &mut Mod) -> Result<(usize, usize), PatchError> {
        if m.inputsettings.is_empty() {
            return Ok((0, 0));
        }

        let path = self.input_settings();
        let mut doc = SettingsDocument::parse(&read_existing(&path)?);
        let (mut added, mut skipped) = (0, 0);

        for binding in &m.inputsettings {
            if doc.contains_line(&binding.context, &binding.line) {
                skipped += 1;
                continue;
            }
            doc.push_line(&binding.context, &binding.line);
            if !m.applied_input_keys.contains(binding) {
                m.applied_input_keys.push(binding.clone());
            }
            added += 1;
        }

        std::fs::write(&path, doc.render())?;
        Ok((added, skipped))
    }

    fn uninstall_input_keys(&self, m: &mut Mod) -> Result<(), PatchError> {
        if m.applied_input_keys.is_empty() {
            return Ok(());
        }
        let path = self.input_settings();
        if path.is_file() {
            let mut doc = SettingsDocument::parse(&read_existing(&path)?);
            for binding in &m.applied_input_keys {
                doc.remove_line(&binding.context, &binding.line);
            }
            std::fs::write(&path, doc.render())?;
        }
        m.applied_input_keys.clear();
        Ok(())
    }

    fn install_user_settings(&self, m: &mut Mod) -> Result<(), PatchError> {
        if m.usersettings.is_empty() {
            return Ok(());
        }
        let path = self.user_settings();
        let mut doc = SettingsDocument::parse(&read_existing(&path)?);
        for setting in &m.usersettings {
            doc.set_value(&setting.section, &setting.key, &setting.value);
        }
        std::fs::write(&path, doc.render())?;
        Ok(())
    }

    fn uninstall_user_settings(&self, m: &mut Mod) -> Result<(), PatchError> {
        if m.usersettings.is_empty() {
            return Ok(());
        }
        let path = self.user_settings();
        if !path.is_file() {
            return Ok(());
        }
        let mut doc = SettingsDocument::parse(&read_existing(&path)?);
        for setting in &m.usersettings {
            // only drop values nobody changed since
            if doc.value(&setting.section, &setting.key) == Some(setting.value.as_str()) {
                doc.remove_key(&setting.section, &setting.key);
            }
        }
        std::fs::write(&path, doc.render())?;
        Ok(())
    }

    fn check_priority(&self, m: &mut Mod) {
        let path = self.mods_settings();
        if m.priority.is_none() && !path.is_file() {
            return;
        }

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                return;
            }
        };
        let mut doc = SettingsDocument::parse(&text);

        let Some(priority) = m.priority else {
            m.priority = m.files.iter().find_map(|folder| {
                doc.value(folder, "Priority")
                    .and_then(|p| p.trim().parse::<i32>().ok())
            });
            if let Some(priority) = m.priority {
                tracing::debug!("{} keeps load priority {}", m.name, priority);
            }
            return;
        };

        for folder in &m.files {
            doc.set_value(folder, "Enabled", if m.enabled { "1" } else { "0" });
            doc.set_value(folder, "Priority", &priority.to_string());
        }

        if let Err(e) = std::fs::write(&path, doc.render()) {
            tracing::warn!("Could not update {}: {}", path.display(), e);
        }
    }

    fn enable(&self, m: &mut Mod) -> Result<Vec<Region>, PatchError> {
        self.rename_folders(m, true)?;
        m.enabled = true;

        let mut failed = Vec::new();
        for region in Region::INSTALL_ORDER {
            let result = match region {
                Region::Menus => self.install_menus(m),
                Region::XmlKeys => self.install_xml_keys(m),
                Region::InputKeys => self.install_input_keys(m).map(|_| ()),
                Region::UserSettings => self.install_user_settings(m),
            };
            if let Err(e) = result {
                tracing::warn!("Re-applying {} for {} failed: {}", region.surface(), m.name, e);
                failed.push(region);
            }
        }
        self.check_priority(m);
        Ok(failed)
    }

    fn disable(&self, m: &mut Mod) -> Result<(), PatchError> {
        self.uninstall_user_settings(m)?;
        self.uninstall_xml_keys(m)?;
        self.uninstall_menus(m)?;
        self.uninstall_input_keys(m)?;
        self.rename_folders(m, false)?;
        m.enabled = false;
        self.check_priority(m);
        Ok(())
    }
}
