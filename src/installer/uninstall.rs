use super::fsops;
use super::patch::{self, not_installed_notice};
use super::{Installer, ReinstallOutcome};
use crate::error::format_user_error;
use crate::mods::Mod;
use anyhow::{anyhow, Context, Result};

impl Installer<'_> {
    /// Remove a mod's config additions, folders and registry entry
    ///
    /// Stops at the first failure and leaves the registry entry in place.
    pub fn uninstall_mod(&mut self, m: &mut Mod) -> bool {
        self.emit(&format!("Uninstalling {}", m.name));
        match self.run_uninstall(m) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Uninstall of {} failed: {:#}", m.name, e);
                self.emit(&format_user_error(e));
                false
            }
        }
    }

    fn run_uninstall(&mut self, m: &mut Mod) -> Result<()> {
        self.enable_for_maintenance(m)?;

        self.patcher.uninstall_menus(m)?;
        self.patcher.uninstall_xml_keys(m)?;
        self.patcher.uninstall_user_settings(m)?;
        self.patcher.uninstall_input_keys(m)?;

        self.remove_menus(m)?;
        self.remove_dlcs(m)?;
        self.remove_data(m)?;

        self.model.remove(&m.name);
        Ok(())
    }

    /// Re-apply an installed mod's config regions
    pub fn reinstall_mod(&mut self, m: &mut Mod) -> ReinstallOutcome {
        self.emit(&format!("Reinstalling {}", m.name));

        let result = self
            .enable_for_maintenance(m)
            .and_then(|()| patch::run_reinstall_patches(self.patcher, m).map_err(Into::into));

        match result {
            Ok(report) => {
                for notice in &report.notices {
                    self.emit(notice);
                }
                ReinstallOutcome {
                    success: true,
                    incomplete: report.incomplete,
                }
            }
            Err(e) => {
                tracing::error!("Reinstall of {} failed: {:#}", m.name, e);
                self.emit(&format_user_error(e));
                ReinstallOutcome {
                    success: false,
                    incomplete: false,
                }
            }
        }
    }

    /// Activate a disabled mod
    pub fn enable_mod(&mut self, m: &mut Mod) -> bool {
        if m.enabled {
            return true;
        }
        self.emit(&format!("Enabling {}", m.name));
        match self.enable_for_maintenance(m) {
            Ok(()) => true,
            Err(e) => {
                self.emit(&format_user_error(e));
                false
            }
        }
    }

    /// Deactivate a mod, reversing its config additions
    pub fn disable_mod(&mut self, m: &mut Mod) -> bool {
        if !m.enabled {
            return true;
        }
        self.emit(&format!("Disabling {}", m.name));
        match self.patcher.disable(m) {
            Ok(()) => true,
            Err(e) => {
                self.emit(&format_user_error(e));
                false
            }
        }
    }

    /// [`Installer::uninstall_mod`] on a registry entry
    pub fn uninstall_named(&mut self, name: &str) -> Result<bool> {
        self.on_registered(name, |installer, m| installer.uninstall_mod(m))
    }

    /// [`Installer::reinstall_mod`] on a registry entry
    pub fn reinstall_named(&mut self, name: &str) -> Result<ReinstallOutcome> {
        self.on_registered(name, |installer, m| installer.reinstall_mod(m))
    }

    /// [`Installer::enable_mod`] on a registry entry
    pub fn enable_named(&mut self, name: &str) -> Result<bool> {
        self.on_registered(name, |installer, m| installer.enable_mod(m))
    }

    /// [`Installer::disable_mod`] on a registry entry
    pub fn disable_named(&mut self, name: &str) -> Result<bool> {
        self.on_registered(name, |installer, m| installer.disable_mod(m))
    }

    /// Run `op` on a copy of a registry entry and store the copy back if the
    /// entry still exists afterwards
    fn on_registered<R>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut Self, &mut Mod) -> R,
    ) -> Result<R> {
        let mut m = self
            .model
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Mod '{}' is not installed", name))?;
        let result = op(self, &mut m);
        if let Some(entry) = self.model.get_mut(name) {
            *entry = m;
        }
        Ok(result)
    }

    /// Enable a disabled mod before working on it, reporting regions that
    /// could not be re-applied
    fn enable_for_maintenance(&mut self, m: &mut Mod) -> Result<()> {
        if m.enabled {
            return Ok(());
        }
        let failed = self.patcher.enable(m)?;
        for region in failed {
            self.emit(&not_installed_notice(region));
        }
        Ok(())
    }

    fn remove_menus(&mut self, m: &Mod) -> Result<()> {
        let paths = self.paths;
        let Some(root) = paths.menu.as_deref().filter(|r| r.is_dir()) else {
            return Ok(());
        };
        for menu in &m.menus {
            let path = root.join(menu);
            if !path.exists() {
                continue;
            }
            if paths.is_protected_menu(menu) {
                self.emit(&format!("Note: Additions to {} will not be removed.", menu));
            } else {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }

    fn remove_dlcs(&self, m: &Mod) -> Result<()> {
        let Some(root) = self.paths.dlc.as_deref().filter(|r| r.is_dir()) else {
            return Ok(());
        };
        for dlc in &m.dlcs {
            fsops::remove_folder(&root.join(dlc))
                .with_context(|| format!("Failed to remove DLC '{}'", dlc))?;
        }
        Ok(())
    }

    fn remove_data(&self, m: &Mod) -> Result<()> {
        let Some(root) = self.paths.mods.as_deref().filter(|r| r.is_dir()) else {
            return Ok(());
        };
        for folder in &m.files {
            fsops::remove_folder(&root.join(folder))
                .with_context(|| format!("Failed to remove mod folder '{}'", folder))?;
        }
        Ok(())
    }
}
