//! CLI command action handlers

use super::{App, StdinPrompt};
use crate::installer::Installer;
use crate::mods::{
    ArchiveFetcher, ConflictDecision, ConflictPrompt, FixedAnswer, GamePatcher, Mod,
};
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

impl App {
    // ========== Mod Commands ==========

    pub async fn cmd_install(
        &mut self,
        sources: &[String],
        answer: Option<ConflictDecision>,
    ) -> Result<()> {
        let paths = self.config.install_paths();
        if paths.game.is_none() && paths.mods.is_none() {
            bail!("No game folder configured. Use 'w3modman config set-game <path>' first.");
        }

        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {percent:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        let mut prompt: Box<dyn ConflictPrompt> = match answer {
            Some(answer) => Box::new(FixedAnswer(answer)),
            None if !self.config.confirm_overwrite => {
                Box::new(FixedAnswer(ConflictDecision::YesToAll))
            }
            None => Box::new(StdinPrompt::new(bar.clone())),
        };

        let fetcher = ArchiveFetcher::default();
        let patcher = GamePatcher::new(paths.clone());
        let (mut installed, mut incomplete, mut failed) = (0, 0, 0);

        {
            let mut installer =
                Installer::new(&mut self.model, &paths, &fetcher, &patcher, prompt.as_mut())
                    .on_progress(|value| bar.set_position((value * 100.0).round() as u64))
                    .on_output(|line| bar.println(line));

            for source in sources {
                let source = absolute(Path::new(source));
                let label = source
                    .file_name()
                    .map(|n| Mod::format_name(&n.to_string_lossy()))
                    .unwrap_or_default();
                bar.set_position(0);
                bar.set_message(label);

                let summary = installer.install_mod(&source);
                installed += summary.installed;
                incomplete += summary.incomplete;
                if !summary.success {
                    failed += 1;
                }
            }
        }
        bar.finish_and_clear();

        self.save_model()?;
        println!("Installed {} mod(s), {} incomplete", installed, incomplete);

        if failed > 0 {
            bail!("{} of {} source(s) failed to install", failed, sources.len());
        }
        Ok(())
    }

    pub async fn cmd_uninstall(&mut self, name: &str) -> Result<()> {
        let name = self.resolve_name(name)?;
        if !self.run_maintenance(|installer| installer.uninstall_named(&name))? {
            bail!("Failed to uninstall '{}'", name);
        }
        println!("Uninstalled {}", name);
        Ok(())
    }

    pub async fn cmd_reinstall(&mut self, name: &str) -> Result<()> {
        let name = self.resolve_name(name)?;
        let outcome = self.run_maintenance(|installer| installer.reinstall_named(&name))?;
        if !outcome.success {
            bail!("Failed to reinstall '{}'", name);
        }
        if outcome.incomplete {
            println!("Reinstalled {} (incomplete)", name);
        } else {
            println!("Reinstalled {}", name);
        }
        Ok(())
    }

    pub async fn cmd_enable(&mut self, name: &str) -> Result<()> {
        let name = self.resolve_name(name)?;
        if !self.run_maintenance(|installer| installer.enable_named(&name))? {
            bail!("Failed to enable '{}'", name);
        }
        println!("Enabled {}", name);
        Ok(())
    }

    pub async fn cmd_disable(&mut self, name: &str) -> Result<()> {
        let name = self.resolve_name(name)?;
        if !self.run_maintenance(|installer| installer.disable_named(&name))? {
            bail!("Failed to disable '{}'", name);
        }
        println!("Disabled {}", name);
        Ok(())
    }

    pub async fn cmd_list(&self) -> Result<()> {
        let visible: Vec<&Mod> = self.model.all().filter(|m| !m.hidden).collect();
        if visible.is_empty() {
            println!("No mods installed.");
            return Ok(());
        }

        println!(
            "{:<40} {:<8} {:<8} {:<20} Folders",
            "Name", "Enabled", "Priority", "Installed"
        );
        println!("{:-<100}", "");
        for m in visible {
            let priority = m.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
            let folders: Vec<&str> = m
                .files
                .iter()
                .chain(m.dlcs.iter())
                .map(|s| s.as_str())
                .collect();
            println!(
                "{:<40} {:<8} {:<8} {:<20} {}",
                Mod::format_name(&m.name),
                if m.enabled { "yes" } else { "no" },
                priority,
                m.date,
                folders.join(", ")
            );
        }
        Ok(())
    }

    /// Accept either the stored source name or its display name
    fn resolve_name(&self, name: &str) -> Result<String> {
        if self.model.get(name).is_some() {
            return Ok(name.to_string());
        }
        let matches: Vec<&Mod> = self
            .model
            .all()
            .filter(|m| Mod::format_name(&m.name).eq_ignore_ascii_case(name))
            .collect();
        match matches.as_slice() {
            [m] => Ok(m.name.clone()),
            [] => bail!("Mod '{}' is not installed. Run 'w3modman list' to see installed mods.", name),
            _ => bail!("'{}' matches several installed mods, use the full source name", name),
        }
    }

    // ========== Config Commands ==========

    pub async fn cmd_config_show(&self) -> Result<()> {
        let paths = self.config.install_paths();
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unavailable)".to_string())
        };

        println!("Configuration");
        println!("{:-<40}", "");
        println!("Config file:   {}", self.config.paths.config_file().display());
        println!("Database:      {}", self.config.paths.database_file().display());
        println!("Game folder:   {}", show(&paths.game));
        println!("Mods folder:   {}", show(&paths.mods));
        println!("DLC folder:    {}", show(&paths.dlc));
        println!("Menu folder:   {}", show(&paths.menu));
        println!("Settings:      {}", paths.settings.display());
        println!("Scratch:       {}", paths.extracted.display());
        println!("Confirm overwrite: {}", self.config.confirm_overwrite);
        Ok(())
    }

    pub async fn cmd_config_set_game(&mut self, path: &str) -> Result<()> {
        let path = absolute(Path::new(path.trim()));
        if !path.is_dir() {
            bail!("Game folder '{}' does not exist", path.display());
        }
        if !path.join("bin").is_dir() || !path.join("content").is_dir() {
            tracing::warn!("{} does not look like a Witcher 3 install", path.display());
            println!("Warning: no bin/ and content/ folders found in {}", path.display());
        }
        self.config.game_path = Some(path.to_string_lossy().to_string());
        self.config.save().await?;
        println!("Game folder set to {}", path.display());
        Ok(())
    }

    pub async fn cmd_config_set_settings_dir(&mut self, path: &str) -> Result<()> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            self.config.settings_dir = None;
            self.config.save().await?;
            println!("Settings folder reset to {}", self.config.settings_dir().display());
            return Ok(());
        }
        let path = absolute(Path::new(trimmed));
        if !path.is_dir() {
            bail!("Settings folder '{}' does not exist", path.display());
        }
        self.config.settings_dir = Some(path.to_string_lossy().to_string());
        self.config.save().await?;
        println!("Settings folder set to {}", path.display());
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
