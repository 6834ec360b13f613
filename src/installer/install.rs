use super::fsops::{self, ScratchGuard};
use super::{patch, InstallSummary, Installer};
use crate::error::{format_user_error, InstallError};
use crate::mods::{
    contains_content_folder, resolve_conflict, ConflictAction, ContentKind, FetchedMod, Mod,
};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

/// Counters of one attempt
#[derive(Default)]
struct Attempt {
    module: Option<Mod>,
    installed: usize,
    incomplete: usize,
}

impl Installer<'_> {
    /// Install a mod from an archive or folder
    ///
    /// On a hard failure the partially installed mod is uninstalled again and
    /// the installed count is reset to 0.
    pub fn install_mod(&mut self, source: &Path) -> InstallSummary {
        if let Some(game) = self.paths.game.as_deref() {
            if fsops::is_within(source, game) {
                let err = InstallError::SourceInsideGame {
                    path: source.to_path_buf(),
                    game: game.to_path_buf(),
                };
                self.emit(&format_user_error(err));
                return InstallSummary::rejected();
            }
        }

        let _scratch = ScratchGuard::new(&self.paths.extracted);
        let mut attempt = Attempt::default();

        match self.run_install(source, &mut attempt) {
            Ok(()) => InstallSummary {
                success: true,
                installed: attempt.installed,
                incomplete: attempt.incomplete,
            },
            Err(e) => {
                tracing::error!("Install of {} failed: {:#}", source.display(), e);
                self.emit(&format_user_error(e));
                if let Some(mut partial) = attempt.module.take() {
                    self.uninstall_mod(&mut partial);
                }
                InstallSummary {
                    success: false,
                    installed: 0,
                    incomplete: attempt.incomplete,
                }
            }
        }
    }

    fn run_install(&mut self, source: &Path, attempt: &mut Attempt) -> Result<()> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| source.display().to_string());

        self.emit(&format!("Installing {}", Mod::format_name(&name)));
        self.report(0.1);

        let FetchedMod {
            module,
            directories,
            xmls,
        } = self.fetcher.fetch(source, &self.paths.extracted)?;

        let m = attempt.module.insert(module);
        m.date = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        m.name = name;

        let mods_root = self
            .paths
            .mods
            .clone()
            .ok_or(InstallError::ModsFolderUnavailable)?;
        let dlc_root = self
            .paths
            .dlc
            .clone()
            .ok_or(InstallError::DlcFolderUnavailable)?;
        let installed_mods = fsops::list_names(&mods_root).context("Failed to list mods folder")?;
        let installed_dlcs = fsops::list_names(&dlc_root).context("Failed to list DLC folder")?;

        self.report(0.2);

        let step = 0.5 / directories.len().max(1) as f32;
        for (index, directory) in directories.iter().enumerate() {
            match self.classifier.classify_path(directory) {
                ContentKind::Mod => {
                    attempt.installed +=
                        self.place(directory, &mods_root, ContentKind::Mod, &installed_mods)?;
                }
                ContentKind::Dlc => {
                    attempt.installed +=
                        self.place(directory, &dlc_root, ContentKind::Dlc, &installed_dlcs)?;
                }
                ContentKind::Unknown => {
                    if contains_content_folder(directory) {
                        let shown = directory
                            .strip_prefix(&self.paths.extracted)
                            .or_else(|_| directory.strip_prefix(source))
                            .unwrap_or(directory);
                        self.emit(&format!(
                            "Detected data folder but could not recognize it as part of a mod or dlc: {}",
                            shown.display()
                        ));
                        self.emit(
                            "  Some manual installation may be required, please check the mod to make sure.",
                        );
                    }
                }
            }
            self.report(0.2 + step * (index + 1) as f32);
        }

        if !xmls.is_empty() {
            let menu_root = self
                .paths
                .menu
                .clone()
                .ok_or(InstallError::MenuFolderUnavailable)?;
            std::fs::create_dir_all(&menu_root).context("Failed to create menu folder")?;
            for xml in &xmls {
                let Some(file_name) = xml.file_name() else {
                    continue;
                };
                std::fs::copy(xml, menu_root.join(file_name))
                    .with_context(|| format!("Failed to copy {}", xml.display()))?;
            }
        }

        self.report(0.8);

        if !m.has_content() {
            return Err(InstallError::NoDataFound(m.name.clone()).into());
        }

        let report = patch::run_install_patches(self.patcher, m);
        if report.incomplete {
            attempt.incomplete += 1;
        }
        let has_readmes = !m.readmes.is_empty();
        let module = m.clone();

        for notice in &report.notices {
            self.emit(notice);
        }
        if has_readmes {
            self.emit("Detected one or more README files.");
            self.emit(
                "  Some manual configuration may be required, please read the readme to make sure.",
            );
        }

        self.report(0.9);
        let outcome = self.model.upsert(module);
        tracing::debug!("Registry {:?} for {}", outcome, source.display());
        self.report(1.0);
        Ok(())
    }

    /// Resolve a naming conflict and copy one classified folder
    ///
    /// Returns 1 when the folder was copied.
    fn place(
        &mut self,
        directory: &Path,
        root: &Path,
        kind: ContentKind,
        installed: &BTreeSet<String>,
    ) -> Result<usize> {
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match resolve_conflict(&name, kind, installed, &mut self.policy, &mut *self.prompt) {
            ConflictAction::Copy => {
                fsops::copy_folder(directory, &root.join(&name))
                    .with_context(|| format!("Failed to copy {} '{}'", kind.label(), name))?;
                Ok(1)
            }
            ConflictAction::Skip => {
                tracing::info!("Keeping installed {} '{}'", kind.label(), name);
                Ok(0)
            }
        }
    }
}
