//! recon: replay agent service captures through the reconstruction engine

mod config;
mod replay;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recon_engine::TurnMode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "recon")]
#[command(about = "Rebuild chat messages and turn text from agent service captures", long_about = None)]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Create a default config file and exit
    #[arg(long)]
    init_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Group a stored conversation's items (JSON array) into messages
    Messages {
        /// Capture file, or `-` for stdin
        file: PathBuf,

        /// Timestamp (unix seconds) for items without `created_at`; defaults to now
        #[arg(long)]
        timestamp: Option<i64>,

        /// Print compact JSON
        #[arg(long)]
        compact: bool,
    },
    /// Format a recorded turn (one step event JSON object per line)
    Stream {
        /// Capture file, or `-` for stdin
        file: PathBuf,

        /// Turn mode (plain, reasoning)
        #[arg(short, long)]
        mode: Option<TurnMode>,

        /// Print Server-Sent-Event frames
        #[arg(long)]
        sse: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let cfg = config::Config::load();

    // Setup tracing
    let filter = if args.verbose {
        EnvFilter::new("recon=debug")
    } else if let Some(ref directives) = cfg.log_filter {
        EnvFilter::new(directives)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = args.command else {
        eprintln!("No command given. Run `recon --help` for usage.");
        std::process::exit(2);
    };

    match command {
        Command::Messages {
            file,
            timestamp,
            compact,
        } => {
            let text = replay::read_input(&file)?;
            let fallback = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let grouped = replay::group_capture(&text, fallback)?;
            tracing::debug!(
                "Grouped {} message(s), {} drop(s)",
                grouped.messages.len(),
                grouped.drops.len()
            );
            replay::print_messages(&grouped, compact)?;
        }
        Command::Stream { file, mode, sse } => {
            // CLI takes precedence over config
            let mode = mode.or(cfg.mode).unwrap_or_default();
            let sse = sse || cfg.sse.unwrap_or(false);
            let text = replay::read_input(&file)?;
            let events = replay::parse_event_lines(&text)?;
            tracing::debug!("Replaying {} event(s) in {:?} mode", events.len(), mode);
            let mut stdout = std::io::stdout();
            replay::replay_turn(events, mode, sse, &mut stdout).await?;
        }
    }

    Ok(())
}
