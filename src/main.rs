use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use w3modman::mods::ConflictDecision;
use w3modman::{App, Config};

#[derive(Parser)]
#[command(name = "w3modman")]
#[command(author, version, about = "A command-line mod manager for The Witcher 3")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Mods folder override for this invocation
    #[arg(long)]
    mods_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install mods from archives or folders
    Install {
        /// Archives (.zip, .7z, .rar) or extracted mod folders
        #[arg(required = true)]
        paths: Vec<String>,
        /// Overwrite installed folders without asking
        #[arg(long, conflicts_with = "no_to_all")]
        yes_to_all: bool,
        /// Keep installed folders without asking
        #[arg(long)]
        no_to_all: bool,
    },
    /// Uninstall a mod
    Uninstall { name: String },
    /// Re-apply a mod's menu, key and settings additions
    Reinstall { name: String },
    /// Enable a mod
    Enable { name: String },
    /// Disable a mod
    Disable { name: String },
    /// List installed mods
    List,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show resolved folders
    Show,
    /// Set the game installation folder
    SetGame { path: String },
    /// Set the folder holding input.settings and user.settings (empty resets)
    SetSettingsDir { path: String },
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "w3modman=info",
        1 => "w3modman=debug",
        2 => "w3modman=trace",
        _ => "trace",
    };

    let log_dir = std::env::var_os("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".w3modman");

    std::fs::create_dir_all(&log_dir).ok();
    let log_file = log_dir.join("w3modman.log");

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    let file_layer = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
    {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(file)),
        ),
        Err(e) => {
            eprintln!("Could not open {}: {}", log_file.display(), e);
            None
        }
    };

    // stderr only with -v
    let stderr_layer = (verbosity > 0).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Load configuration
    let mut config = Config::load().await?;
    if let Some(mods_dir) = cli.mods_dir.as_deref() {
        let trimmed = mods_dir.trim();
        if trimmed.is_empty() {
            anyhow::bail!("--mods-dir cannot be empty");
        }
        config.mods_dir_override = Some(trimmed.to_string());
    }

    let mut app = App::new(config).await?;

    match cli.command {
        Commands::Install {
            paths,
            yes_to_all,
            no_to_all,
        } => {
            let answer = if yes_to_all {
                Some(ConflictDecision::YesToAll)
            } else if no_to_all {
                Some(ConflictDecision::NoToAll)
            } else {
                None
            };
            app.cmd_install(&paths, answer).await?
        }
        Commands::Uninstall { name } => app.cmd_uninstall(&name).await?,
        Commands::Reinstall { name } => app.cmd_reinstall(&name).await?,
        Commands::Enable { name } => app.cmd_enable(&name).await?,
        Commands::Disable { name } => app.cmd_disable(&name).await?,
        Commands::List => app.cmd_list().await?,
        Commands::Config { action } => match action {
            ConfigCommands::Show => app.cmd_config_show().await?,
            ConfigCommands::SetGame { path } => app.cmd_config_set_game(&path).await?,
            ConfigCommands::SetSettingsDir { path } => {
                app.cmd_config_set_settings_dir(&path).await?
            }
        },
    }

    Ok(())
}
