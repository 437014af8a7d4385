use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arcade_bot::bridge;
use arcade_bot::core::config::ArcadeConfig;
use arcade_bot::terminal::{self, TerminalSink};
use arcade_bot::{GameKind, SessionRegistry};
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Select};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcade")]
#[command(about = "🕹️ Real-time snake and runner games for chat bots")]
#[command(version)]
pub struct Cli {
    /// TOML file with game tuning (ARCADE__* variables override it)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a game in this terminal
    Play {
        /// Game to play (if not specified, will show selection)
        #[arg(short, long)]
        game: Option<GameKind>,

        /// Write logs to this file instead of discarding them
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Serve JSON-lines commands on stdin, events on stdout
    Bridge,
    /// List available games
    List,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Logs go to stderr; stdout belongs to the bridge protocol.
fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// The terminal is owned by the UI while playing, so logs go to a file or nowhere.
fn init_play_tracing(log: Option<&PathBuf>) -> Result<()> {
    match log {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::sink)
                .init();
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ArcadeConfig> {
    ArcadeConfig::load(path).context("loading configuration")
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Play { game, log }) => {
            init_play_tracing(log.as_ref())?;
            let config = load_config(cli.config.as_deref())?;
            let kind = match game {
                Some(kind) => kind,
                None => select_game()?,
            };
            play(config, kind).await?;
        }

        Some(Commands::Bridge) => {
            init_stderr_tracing();
            let config = load_config(cli.config.as_deref())?;
            info!(?config, "configuration loaded");

            let sink = Arc::new(bridge::JsonLinesSink::new(tokio::io::stdout()));
            let registry = SessionRegistry::new(config, sink)?;
            bridge::run(&registry, BufReader::new(tokio::io::stdin()))
                .await
                .context("reading bridge commands")?;
        }

        Some(Commands::List) => list_games(),

        None => {
            // No subcommand provided - show interactive menu
            init_play_tracing(None)?;
            show_main_menu(cli.config).await?;
        }
    }

    Ok(())
}

async fn play(config: ArcadeConfig, kind: GameKind) -> Result<()> {
    let (sink, screens) = TerminalSink::new();
    let registry = SessionRegistry::new(config, Arc::new(sink))?;
    terminal::play(registry, kind, screens).await
}

fn list_games() {
    println!("🎮 Available games:");
    println!();

    for kind in GameKind::ALL {
        let info = kind.info();
        println!("📦 {} ({})", info.name, info.id);
        println!("   {}", info.description);
        println!();
    }
}

fn select_game() -> Result<GameKind> {
    let games = GameKind::ALL;
    if games.is_empty() {
        bail!("No games available");
    }

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("🎮 Select a game")
        .items(
            &games
                .iter()
                .map(|g| format!("{} - {}", g.info().name, g.info().description))
                .collect::<Vec<_>>(),
        )
        .interact()?;

    Ok(games[selection])
}

async fn show_main_menu(config_path: Option<PathBuf>) -> Result<()> {
    println!("🕹️  Welcome to Arcade!");
    println!("   Snake and runner, one tick at a time");
    println!();

    let options = vec!["🎮 Play a game", "📋 List available games", "🚪 Exit"];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What would you like to do?")
        .items(&options)
        .interact()?;

    match selection {
        0 => {
            let config = load_config(config_path.as_deref())?;
            let kind = select_game()?;
            play(config, kind).await?;
        }
        1 => {
            println!();
            list_games();
        }
        _ => println!("👋 Goodbye!"),
    }

    Ok(())
}
