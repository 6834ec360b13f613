//! Application state and orchestration

mod actions;
mod prompt;

pub use prompt::{parse_answer, StdinPrompt};

use crate::config::Config;
use crate::db::Database;
use crate::installer::Installer;
use crate::model::Model;
use crate::mods::{ArchiveFetcher, ConflictDecision, FixedAnswer, GamePatcher};

use anyhow::{Context, Result};

/// Main application struct that ties config, registry and installer together
pub struct App {
    /// Application configuration
    pub config: Config,

    /// Registry database
    pub db: Database,

    /// Installed mods, loaded from the database
    pub model: Model,
}

impl App {
    /// Create a new App instance
    pub async fn new(config: Config) -> Result<Self> {
        // Ensure directories exist
        config.ensure_dirs().context("Failed to create directories")?;

        let db = Database::open(&config.paths.database_file())
            .context("Failed to open database")?;
        let model = db.load_model().context("Failed to load installed mods")?;
        tracing::info!("Loaded {} installed mod(s)", model.len());

        Ok(Self { config, db, model })
    }

    /// Persist the registry
    pub fn save_model(&self) -> Result<()> {
        self.db.save_model(&self.model)
    }

    /// Run a registry maintenance operation (uninstall, reinstall, enable,
    /// disable) and persist the registry afterwards
    fn run_maintenance<R>(
        &mut self,
        op: impl FnOnce(&mut Installer<'_>) -> Result<R>,
    ) -> Result<R> {
        let paths = self.config.install_paths();
        let fetcher = ArchiveFetcher::default();
        let patcher = GamePatcher::new(paths.clone());
        let mut prompt = FixedAnswer(ConflictDecision::No);

        let result = {
            let mut installer =
                Installer::new(&mut self.model, &paths, &fetcher, &patcher, &mut prompt)
                    .on_output(|line| println!("{}", line));
            op(&mut installer)
        };

        self.save_model()?;
        result
    }
}
