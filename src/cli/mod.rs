//! Command-line front end: argument parsing, logging setup and the REPL.

mod commands;
mod render;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use a2a_cli::config::{ClientConfig, StreamingMode};
use a2a_cli::session::{Connection, SessionHandle, TaskOutcome};

use commands::{Command, HELP};
use render::TerminalSink;

/// Terminal client for Agent-to-Agent (A2A) agents.
#[derive(Parser, Debug)]
#[command(name = "a2a-cli", version, about)]
pub struct Cli {
    /// Agent base URL to connect to on startup.
    #[arg(long, short = 'a', env = "A2A_AGENT_URL")]
    pub agent_url: Option<String>,

    /// Send one task, print its output and exit.
    #[arg(long, short = 't')]
    pub task: Option<String>,

    /// Config file (default: <config dir>/a2a-cli/config.toml).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Seconds to wait for the first response to a task.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Use message/send even if the agent can stream.
    #[arg(long)]
    pub no_stream: bool,

    /// More log output on stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "warn,a2a_cli=debug",
        _ => "info,a2a_cli=trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::from_default_location()?,
    };
    if let Some(secs) = cli.timeout {
        config.task_timeout_secs = secs;
    }
    if cli.no_stream {
        config.streaming = StreamingMode::Never;
    }
    let agent_url = cli.agent_url.clone().or_else(|| config.agent_url.clone());

    let mut conn = Connection::new(config, TerminalSink);
    if let Some(url) = &agent_url {
        connect(&mut conn, url).await;
    }

    match cli.task {
        Some(task) => one_shot(&mut conn, &task).await,
        None => repl(&mut conn).await,
    }
}

async fn one_shot(conn: &mut Connection, task: &str) -> anyhow::Result<()> {
    if !conn.is_connected() {
        anyhow::bail!("no agent connected; pass --agent-url or set A2A_AGENT_URL");
    }

    let handle = conn.send_task(task).await?;
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            handle.wait().await
        }
    };

    match outcome {
        TaskOutcome::Completed | TaskOutcome::Cancelled => Ok(()),
        TaskOutcome::Failed(err) => Err(err.into()),
    }
}

async fn repl(conn: &mut Connection) -> anyhow::Result<()> {
    println!("{}", "A2A terminal client. Type /help for commands.".bold());
    if !conn.is_connected() {
        println!("{}", "Not connected. Use /connect <url>.".dimmed());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut running: Option<SessionHandle> = None;

    loop {
        if running.is_none() {
            prompt();
        }

        let waiting = running.clone();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_line(conn, &mut running, &line).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let cancelled = running.take().map(|h| h.cancel()).unwrap_or(false);
                if !cancelled {
                    println!();
                    println!("{}", "No task running. Use /quit to exit.".dimmed());
                }
            }
            outcome = wait_for(waiting) => {
                running = None;
                tracing::debug!(?outcome, "task ended");
                println!();
            }
        }
    }

    conn.disconnect().await;
    Ok(())
}

async fn wait_for(handle: Option<SessionHandle>) -> TaskOutcome {
    match handle {
        Some(handle) => handle.wait().await,
        None => std::future::pending().await,
    }
}

fn prompt() {
    print!("{} ", ">".bold());
    let _ = std::io::stdout().flush();
}

/// Returns `false` when the user asked to quit.
async fn handle_line(
    conn: &mut Connection,
    running: &mut Option<SessionHandle>,
    line: &str,
) -> bool {
    match commands::parse(line) {
        Command::Empty => {}
        Command::Quit => return false,
        Command::Help => println!("{HELP}"),
        Command::Unknown(name) => {
            println!("{} {} (try /help)", "Unknown command:".yellow(), name)
        }
        Command::Connect(None) => println!("{}", "Usage: /connect <url>".yellow()),
        Command::Connect(Some(url)) => {
            connect(conn, &url).await;
            *running = None;
        }
        Command::Disconnect => {
            if conn.disconnect().await {
                println!("{}", "Disconnected.".dimmed());
            } else {
                println!("{}", "Not connected.".dimmed());
            }
            *running = None;
        }
        Command::Status => print_status(conn),
        Command::Card => match conn.card() {
            Some(card) => match serde_json::to_string_pretty(card) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{} {e}", "Cannot render card:".red()),
            },
            None => println!("{}", "Not connected.".dimmed()),
        },
        Command::Reset => match conn.reset_context() {
            Some(id) => println!("{} {}", "New conversation context:".dimmed(), id),
            None => println!("{}", "Not connected.".dimmed()),
        },
        Command::Cancel => {
            if !conn.cancel_current() {
                println!("{}", "No task running.".dimmed());
            }
            *running = None;
        }
        Command::Task(text) => match conn.send_task(&text).await {
            Ok(handle) => *running = Some(handle),
            Err(e) => println!("{} Use /connect <url>.", e.to_string().red()),
        },
    }
    true
}

async fn connect(conn: &mut Connection, url: &str) {
    match conn.connect(url).await {
        Ok(capabilities) => {
            if let Some(info) = conn.info() {
                println!(
                    "{} {} {}",
                    "Connected to".green(),
                    info.agent_name.bold(),
                    format!("({})", info.endpoint).dimmed()
                );
                let mode = if info.streaming { "streaming" } else { "non-streaming" };
                println!(
                    "  {} {}  {} {}",
                    "mode:".dimmed(),
                    mode,
                    "push notifications:".dimmed(),
                    capabilities.push_notifications.unwrap_or(false)
                );
            }
        }
        Err(e) => println!("{} {}", "Connection failed:".red().bold(), e),
    }
}

fn print_status(conn: &Connection) {
    let Some(info) = conn.info() else {
        println!("{}", "Not connected.".dimmed());
        return;
    };
    println!("  {:<10} {} {}", "agent".dimmed(), info.agent_name, info.agent_version.dimmed());
    println!("  {:<10} {}", "url".dimmed(), info.base_url);
    println!("  {:<10} {}", "endpoint".dimmed(), info.endpoint);
    println!("  {:<10} {}", "context".dimmed(), info.context_id);
    println!("  {:<10} {}", "streaming".dimmed(), info.streaming);
    if let Some(card) = conn.card() {
        if let Some(provider) = &card.provider {
            println!("  {:<10} {}", "provider".dimmed(), provider.organization);
        }
        for skill in &card.skills {
            println!("  {:<10} {} ({})", "skill".dimmed(), skill.name, skill.id.dimmed());
        }
    }
    match conn.current() {
        Some(handle) => println!("  {:<10} {}", "last task".dimmed(), handle.state()),
        None => println!("  {:<10} none", "last task".dimmed()),
    }
}
