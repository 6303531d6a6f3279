// NetLog CLI - extract a log excerpt and ask the Generative Engine about it

use clap::{Parser, Subcommand};
use colored::Colorize;
use netlog_core::{excerpt_from_bytes, LogExcerpt};
use netlog_engine::{build_transport, render_answer, EngineConfig, Session, TransportKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netlog")]
#[command(version = "0.1.0")]
#[command(about = "LLM based network log analyzer", long_about = None)]
struct Cli {
    /// TOML file with Generative Engine settings
    #[arg(short, long, env = "NETLOG_CONFIG")]
    config: Option<PathBuf>,

    /// API token for the Generative Engine (or set API_TOKEN env var)
    #[arg(short = 'k', long, env = "API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the error/warning excerpt that would be sent to the model
    Extract {
        /// Path to log file
        file: PathBuf,
    },

    /// Ask a question about a log file
    Ask {
        /// Path to log file
        file: PathBuf,

        /// Your question in natural language
        question: String,

        /// Transport to use (websocket/ws or rest/http)
        #[arg(short, long)]
        transport: Option<TransportKind>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // logs go to stderr so answers can be piped
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Extract { file } => {
            let excerpt = read_excerpt(file)?;
            show_excerpt(&excerpt);
        }
        Commands::Ask {
            file,
            question,
            transport,
        } => {
            let excerpt = read_excerpt(file)?;
            let mut config = engine_config(&cli)?;
            if let Some(kind) = transport {
                config = config.with_transport(*kind);
            }
            ask(config, &excerpt, question).await?;
        }
    }

    Ok(())
}

fn read_excerpt(path: &Path) -> Result<LogExcerpt, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    Ok(excerpt_from_bytes(&bytes)?)
}

// file settings (if any), then env overrides; the --api-token flag wins over API_TOKEN
fn engine_config(cli: &Cli) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let base = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let token = cli.api_token.clone();
    let config = base.apply_env(|key| match key {
        "API_TOKEN" => token.clone(),
        _ => std::env::var(key).ok(),
    })?;
    Ok(config)
}

fn show_excerpt(excerpt: &LogExcerpt) {
    if excerpt.is_empty() {
        println!("{}", "No error or warning lines found.".yellow());
        return;
    }

    println!("{}", excerpt);
    println!("\n{}", "─".repeat(50).dimmed());
    println!(
        "{} {} | {} {}{}",
        "Lines:".dimmed(),
        excerpt.matched_lines().to_string().yellow(),
        "Chars:".dimmed(),
        excerpt.char_len().to_string().yellow(),
        if excerpt.truncated() {
            format!(" | {}", "truncated".magenta())
        } else {
            String::new()
        }
    );
}

async fn ask(
    config: EngineConfig,
    excerpt: &LogExcerpt,
    question: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let question = question.trim();
    if question.is_empty() {
        return Err("question must not be empty".into());
    }
    if excerpt.is_empty() {
        println!("{}", "No error or warning lines found, asking anyway.".yellow());
    }

    println!("\n{}", "🤖 Asking Generative Engine...".cyan().bold());
    println!("{}", "─".repeat(50).dimmed());

    let transport = build_transport(Arc::new(config), CancellationToken::new());
    let session = Session::new();
    let start = Instant::now();

    let result = transport.ask(&session, excerpt.as_str(), question).await;
    let ok = result.is_ok();
    let answer = render_answer(result);

    println!("\n{}", "Response:".green().bold());
    if ok {
        println!("{}", answer);
    } else {
        println!("{}", answer.red());
    }

    println!("\n{}", "─".repeat(50).dimmed());
    println!(
        "{} {} | {} {} | {} {}ms",
        "Transport:".dimmed(),
        transport.kind().to_string().cyan(),
        "Session:".dimmed(),
        session.to_string().dimmed(),
        "Time:".dimmed(),
        start.elapsed().as_millis().to_string().yellow()
    );

    Ok(())
}
