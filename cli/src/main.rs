// qrshare: desktop CLI for the QR share pipeline
//
// Cross-platform (macOS, Linux, Windows) front-end: turn text into a QR
// code in the terminal or as SVG, decode scanned strings, and manage
// preferences and configuration.

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use qrshare_core::store::{PreferenceValue, ENCRYPTED_SHARE, QR_ERROR_CORRECTION};
use qrshare_core::{
    qr, DebouncedEncoder, EncodedForm, ErrorCorrection, PlatformCapabilities, PreferenceStore,
    ShareKey, ShareService, SharedPayload,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrshare")]
#[command(about = "QR Share: pass text between devices through a QR code", long_about = None)]
#[command(version)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode text and show it as a QR code
    Encode {
        text: String,
        #[command(flatten)]
        mode: ModeArgs,
        /// Write an SVG image to this file
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Decode a scanned wire string back to text
    Decode {
        wire: String,
        #[command(flatten)]
        mode: ModeArgs,
    },
    /// Re-encode each line from stdin after typing settles
    Live,
    /// Manage share preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show the build key fingerprint
    Key,
}

/// One-off override of the `encryptedShare` preference
#[derive(Args, Clone, Copy)]
#[group(multiple = false)]
struct ModeArgs {
    /// Skip compression and encryption
    #[arg(long)]
    plain: bool,
    /// Force compression and encryption
    #[arg(long)]
    encrypted: bool,
}

impl ModeArgs {
    fn encrypted(self) -> Option<bool> {
        match (self.plain, self.encrypted) {
            (true, _) => Some(false),
            (_, true) => Some(true),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum PrefsAction {
    Set { key: String, value: String },
    Get { key: String },
    /// Return a preference to its default
    Reset { key: String },
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Encode { text, mode, svg } => cmd_encode(text, mode, svg).await,
        Commands::Decode { wire, mode } => cmd_decode(wire, mode).await,
        Commands::Live => cmd_live().await,
        Commands::Prefs { action } => cmd_prefs(action).await,
        Commands::Config { action } => cmd_config(action).await,
        Commands::Key => cmd_key(),
    }
}

fn init_logging(log_file: Option<&std::path::Path>) -> Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some(path) = log_file else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name().context("Log file path has no file name")?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

// ============================================================================
// SETUP
// ============================================================================

fn open_prefs(config: &config::Config) -> Result<Arc<PreferenceStore>> {
    let path = config.prefs_path()?;
    let path = path.to_str().context("Preference path is not valid UTF-8")?;
    let store = PreferenceStore::open(path).context("Failed to open preference store")?;
    debug!(path, "Opened preference store");
    Ok(Arc::new(store))
}

fn open_service(config: &config::Config) -> Result<ShareService> {
    let key = ShareKey::from_build_config().context("Invalid build share key")?;
    info!(fingerprint = %key.fingerprint(), "Using share key");
    Ok(ShareService::new(
        key,
        open_prefs(config)?,
        PlatformCapabilities::desktop(),
    ))
}

fn print_code(form: &EncodedForm, error_correction: ErrorCorrection) -> Result<()> {
    form.ensure_decodable()
        .context("Text is too long to be read back from a QR code")?;
    let art = qr::render_terminal(form.as_str(), error_correction)
        .context("Text does not fit in a QR code")?;
    println!("{}", art);
    let mode = if form.is_encrypted() {
        "encrypted".green()
    } else {
        "plain".yellow()
    };
    println!("{} {} ({} chars)", "Wire:".bold(), mode, form.len());
    println!("{}", form.as_str().bright_cyan());
    Ok(())
}

// ============================================================================
// COMMANDS
// ============================================================================

async fn cmd_encode(text: String, mode: ModeArgs, svg: Option<PathBuf>) -> Result<()> {
    let config = config::Config::load()?;
    let service = open_service(&config)?;
    let payload = SharedPayload::new(text);

    let form = match mode.encrypted() {
        Some(encrypted) => service.encode_with(&payload, encrypted),
        None => service.encode(&payload).await,
    };
    let error_correction = service.error_correction().await;
    print_code(&form, error_correction)?;

    if let Some(path) = svg {
        let (fg, bg) = config.colors()?;
        let document = qr::render_svg(form.as_str(), fg, bg, &config.render_options(error_correction))
            .context("Text does not fit in a QR code")?;
        std::fs::write(&path, document)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} Wrote {}", "✓".green(), path.display().to_string().bright_cyan());
    }

    Ok(())
}

async fn cmd_decode(wire: String, mode: ModeArgs) -> Result<()> {
    let config = config::Config::load()?;
    let service = open_service(&config)?;
    // Pasted scanner output often carries a trailing newline
    let wire = wire.trim();

    let result = match mode.encrypted() {
        Some(encrypted) => service.decode_with(wire, encrypted),
        None => service.decode(wire).await,
    };

    match result {
        Ok(payload) => {
            println!("{}", payload.message());
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e.user_message().red().bold());
            Err(e).context("Decode failed")
        }
    }
}

async fn cmd_live() -> Result<()> {
    let config = config::Config::load()?;
    let service = Arc::new(open_service(&config)?);
    let error_correction = service.error_correction().await;

    println!(
        "{}",
        "Type text and press Enter; Ctrl-D to finish.".dimmed()
    );

    let encoder = DebouncedEncoder::spawn(service, config.debounce());
    let mut results = encoder.subscribe();

    let printer = tokio::spawn(async move {
        while results.changed().await.is_ok() {
            let latest = results.borrow_and_update().clone();
            if let Some(form) = latest {
                if let Err(e) = print_code(&form, error_correction) {
                    eprintln!("{} {}", "✗".red(), e);
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        encoder.push(SharedPayload::new(line));
    }

    encoder.close().await;
    printer.await.context("Printer task failed")?;
    Ok(())
}

async fn cmd_prefs(action: PrefsAction) -> Result<()> {
    let config = config::Config::load()?;
    let prefs = open_prefs(&config)?;

    match action {
        PrefsAction::Set { key, value } => {
            let value = parse_pref(&key, &value)?;
            prefs
                .store(&key, value)
                .context("Failed to save preference")?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        PrefsAction::Get { key } => {
            let value = effective_pref(&prefs, &key)?;
            println!("{} = {}", key.bright_cyan(), value);
        }

        PrefsAction::Reset { key } => {
            // Validates the key name
            effective_pref(&prefs, &key)?;
            prefs.reset(&key).context("Failed to reset preference")?;
            let value = effective_pref(&prefs, &key)?;
            println!("{} Reset {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        PrefsAction::List => {
            println!("{}", "Preferences".bold());
            println!();

            for key in [ENCRYPTED_SHARE.name(), QR_ERROR_CORRECTION.name()] {
                let value = effective_pref(&prefs, key)?;
                let origin = if prefs.load(key).is_some() {
                    "".normal()
                } else {
                    "(default)".dimmed()
                };
                println!("  {:<20} {} {}", key.bright_cyan(), value, origin);
            }
        }
    }

    Ok(())
}

/// Typed value for a known preference key
fn parse_pref(key: &str, value: &str) -> Result<PreferenceValue> {
    if key == ENCRYPTED_SHARE.name() {
        let enabled: bool = value.parse().context("Invalid boolean value")?;
        Ok(PreferenceValue::Bool(enabled))
    } else if key == QR_ERROR_CORRECTION.name() {
        let level: ErrorCorrection = value
            .parse()
            .context("Expected 0-3 or one of L, M, Q, H")?;
        Ok(PreferenceValue::Int(level.index()))
    } else {
        anyhow::bail!("Unknown preference: {}", key)
    }
}

/// Stored value, or the default when unset
fn effective_pref(prefs: &PreferenceStore, key: &str) -> Result<String> {
    if key == ENCRYPTED_SHARE.name() {
        let enabled = match prefs.load(key) {
            Some(PreferenceValue::Bool(v)) => v,
            _ => ENCRYPTED_SHARE.default_value(),
        };
        Ok(enabled.to_string())
    } else if key == QR_ERROR_CORRECTION.name() {
        let index = match prefs.load(key) {
            Some(PreferenceValue::Int(v)) => v,
            _ => QR_ERROR_CORRECTION.default_value(),
        };
        Ok(ErrorCorrection::from_index(index).to_string())
    } else {
        anyhow::bail!("Unknown preference: {}", key)
    }
}

async fn cmd_config(action: ConfigAction) -> Result<()> {
    let mut config = config::Config::load()?;

    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }

            println!();
            println!(
                "  {:<20} {}",
                "config_file".bright_cyan(),
                config::Config::config_file()?.display()
            );
        }
    }

    Ok(())
}

fn cmd_key() -> Result<()> {
    let key = ShareKey::from_build_config().context("Invalid build share key")?;

    println!("{}", "Share Key".bold());
    println!("  Fingerprint: {}", key.fingerprint().bright_yellow());
    if ShareKey::is_build_override() {
        println!("  Source:      {}", "QRSHARE_SHARE_KEY (build)".green());
    } else {
        println!("  Source:      {}", "built-in default".yellow());
        println!();
        println!(
            "{}",
            "⚠️  Codes made with the default key can be read by any qrshare build.".bright_red()
        );
    }
    println!();
    println!(
        "{}",
        "Devices must show the same fingerprint to read each other's encrypted codes.".dimmed()
    );

    Ok(())
}
