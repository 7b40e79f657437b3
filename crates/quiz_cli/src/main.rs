//! Quiz CLI
//!
//! Play the trivia game in a terminal, check question files and manage the
//! saved session.

mod bell;
mod play;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use quiz_core::{
    FileStore, GameConfig, GameMachine, Phase, QuestionBank, SessionStore, SilentAudio,
    SnapshotCodec,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use bell::TerminalBell;

/// Millionaire-style trivia game
#[derive(Parser, Debug)]
#[command(name = "quiz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $QUIZ_CONFIG_PATH, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Question data file
    #[arg(long, global = true)]
    questions: Option<PathBuf>,

    /// Saved session file
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Encoding for new saves
    #[arg(long, global = true, value_enum)]
    codec: Option<CodecArg>,

    /// Start with sound off
    #[arg(long, global = true)]
    mute: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play, resuming the saved session if there is one
    Play,

    /// Check a question file and print what each player would face
    Validate {
        /// File to check (default: the configured question data)
        file: Option<PathBuf>,
    },

    /// Show the saved session without changing it
    Status {
        /// Print the session view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Erase the saved session
    Reset,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecArg {
    Json,
    Packed,
}

impl From<CodecArg> for SnapshotCodec {
    fn from(arg: CodecArg) -> Self {
        match arg {
            CodecArg::Json => SnapshotCodec::Json,
            CodecArg::Packed => SnapshotCodec::Packed,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        (_, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Play => cmd_play(&config),
        Commands::Validate { file } => cmd_validate(&config, file),
        Commands::Status { json } => cmd_status(&config, json, &mut io::stdout()),
        Commands::Reset => cmd_reset(&config, &mut io::stdout()),
    }
}

/// Config file or environment, then command-line overrides.
fn load_config(cli: &Cli) -> Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::from_env().context("Failed to load config from environment")?,
    };

    if let Some(questions) = &cli.questions {
        config.questions_path = Some(questions.clone());
    }
    if let Some(save) = &cli.save {
        config.save_path = save.clone();
    }
    if let Some(codec) = cli.codec {
        config.codec = codec.into();
    }
    if cli.mute {
        config.sound_enabled = false;
    }

    config.validate()?;
    tracing::debug!(?config, "Configuration resolved");
    Ok(config)
}

fn open_store(config: &GameConfig) -> FileStore {
    FileStore::new(&config.save_path, config.codec)
}

fn cmd_play(config: &GameConfig) -> Result<()> {
    let bank = config.question_bank().context("Failed to load question data")?;
    let mut machine = GameMachine::boot(bank, open_store(config), TerminalBell::stderr(), config);
    tracing::info!(phase = ?machine.phase(), "Session ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let outcome = play::run(&mut machine, config, stdin.lock(), &mut stdout);

    let (_store, _bell) = machine.into_parts();
    outcome
}

fn cmd_validate(config: &GameConfig, file: Option<PathBuf>) -> Result<()> {
    let bank = match &file {
        Some(path) => QuestionBank::load(path)
            .with_context(|| format!("Invalid question file {}", path.display()))?,
        None => config.question_bank().context("Invalid question data")?,
    };
    let currency = config.currency_for(&bank);

    println!("Question data OK ({} players)", bank.players().len());
    for player in bank.players() {
        let set = bank.questions_for(&player.id);
        let max = quiz_core::scoring::max_possible(&set, player);
        println!(
            "  {:<12} {:>3} questions, up to {}",
            player.name,
            set.len(),
            max.display_with(currency)
        );
    }
    Ok(())
}

fn cmd_status(config: &GameConfig, json: bool, out: &mut impl Write) -> Result<()> {
    let bank = config.question_bank().context("Failed to load question data")?;
    // Unreadable or inconsistent saves come up at Select like a missing one.
    let machine = GameMachine::boot(bank, open_store(config), SilentAudio, config);

    if machine.phase() == Phase::Select {
        writeln!(out, "No saved session at {}", config.save_path.display())?;
        return Ok(());
    }

    if json {
        writeln!(out, "{}", quiz_core::view_json(&machine)?)?;
        return Ok(());
    }

    let view = machine.view();
    let player = view.player.as_ref().map_or("-", |p| p.name.as_str());
    writeln!(out, "Phase:   {:?}", view.phase)?;
    writeln!(out, "Player:  {}", player)?;
    if view.phase == Phase::Playing {
        writeln!(
            out,
            "Progress: question {} of {}",
            machine.current_index() + 1,
            machine.question_set().len()
        )?;
    }
    if let Some(score) = &view.score {
        writeln!(
            out,
            "Score:   {}/{} correct, {} won",
            score.correct_count,
            score.total_answered,
            view.format_amount(score.amount_won)
        )?;
    }
    Ok(())
}

fn cmd_reset(config: &GameConfig, out: &mut impl Write) -> Result<()> {
    let mut store = open_store(config);
    store
        .clear()
        .with_context(|| format!("Failed to erase {}", config.save_path.display()))?;
    tracing::info!(path = %config.save_path.display(), "Saved session erased");
    writeln!(out, "Saved session erased")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> GameConfig {
        GameConfig { save_path: dir.path().join("session.json"), ..GameConfig::default() }
    }

    fn status_text(config: &GameConfig) -> String {
        let mut out = Vec::new();
        cmd_status(config, false, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_status_without_save() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        assert!(status_text(&config).starts_with("No saved session at"));
        assert!(!config.save_path.exists());
    }

    #[test]
    fn test_status_with_corrupt_save() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        fs::write(&config.save_path, b"{ not a session").unwrap();

        assert!(status_text(&config).starts_with("No saved session at"));
        // Status never rewrites the file.
        assert_eq!(fs::read(&config.save_path).unwrap(), b"{ not a session");
    }

    #[test]
    fn test_status_then_reset() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let bank = config.question_bank().unwrap();
        let player = bank.players()[0].clone();

        let mut machine = GameMachine::boot(bank, open_store(&config), SilentAudio, &config);
        machine.select_player(&player.id).unwrap();
        machine.confirm_start().unwrap();
        drop(machine);

        let text = status_text(&config);
        assert!(text.contains("Phase:   Playing"));
        assert!(text.contains(&player.name));
        assert!(text.contains("Progress: question 1 of"));

        let mut out = Vec::new();
        cmd_status(&config, true, &mut out).unwrap();
        let view: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(view["phase"], "playing");

        let mut out = Vec::new();
        cmd_reset(&config, &mut out).unwrap();
        assert!(!config.save_path.exists());
        assert!(status_text(&config).starts_with("No saved session at"));
    }
}
