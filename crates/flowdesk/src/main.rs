//! flowdesk - terminal console for the workflow messages service.
//!
//! `flowdesk chat` opens the realtime message stream for one thread and
//! sends stdin lines through the send endpoint; the mailbox subcommands wrap
//! the inbox/outbox REST surface. Read-only use works without a token;
//! sending requires one.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use flowdesk::auth::StaticToken;
use flowdesk::chat::{ChatConfig, ChatPanel, ConnectionState, PanelSnapshot, SseTransport};
use flowdesk::messages::MessagesClient;
use flowdesk::settings::Settings;
use flowdesk_protocol::{MailboxMessage, SenderKind};

#[derive(Debug, Parser)]
#[command(
    name = "flowdesk",
    author,
    version,
    about = "Terminal console for the workflow messages service."
)]
struct Cli {
    /// Messages service base URL (overrides the config file)
    #[arg(long, short = 's', env = "FLOWDESK_SERVER_URL", global = true)]
    server: Option<String>,

    /// Bearer token (stream observation works without one)
    #[arg(long, env = "FLOWDESK_TOKEN", global = true)]
    token: Option<String>,

    /// Path to the config file (auto-detected if not set)
    #[arg(long, short = 'c', env = "FLOWDESK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Join a thread and chat from stdin
    Chat {
        /// Thread to join
        #[arg(long, short = 't', default_value = "general")]
        thread: String,
    },
    /// List the inbox for an employee
    Inbox {
        #[arg(long, short = 'e')]
        employee_id: i64,
    },
    /// List the outbox for an employee
    Outbox {
        #[arg(long, short = 'e')]
        employee_id: i64,
    },
    /// Mark an inbox message read
    MarkRead {
        /// Message id
        id: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "Error: {err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    let base_url = cli
        .server
        .clone()
        .unwrap_or_else(|| settings.server.base_url.clone());

    let token_source = Arc::new(StaticToken::new(cli.token.clone()));
    let messages = Arc::new(MessagesClient::new(&base_url, token_source.clone()));

    match cli.command {
        Command::Chat { ref thread } => {
            handle_chat(&cli, &settings, &base_url, token_source, messages, thread).await
        }
        Command::Inbox { employee_id } => {
            let list = messages.inbox(employee_id).await?;
            print_mailbox(&list, "unread", cli.json)
        }
        Command::Outbox { employee_id } => {
            let list = messages.outbox(employee_id).await?;
            print_mailbox(&list, "undelivered", cli.json)
        }
        Command::MarkRead { ref id } => {
            messages.mark_read(id).await?;
            println!("Marked {id} read.");
            Ok(())
        }
    }
}

async fn handle_chat(
    cli: &Cli,
    settings: &Settings,
    base_url: &str,
    token_source: Arc<StaticToken>,
    messages: Arc<MessagesClient>,
    thread: &str,
) -> Result<()> {
    let transport = Arc::new(SseTransport::new(base_url, thread, token_source));

    let mut config = ChatConfig::new(thread);
    config.pending_timeout = Duration::from_secs(settings.chat.pending_timeout_secs);
    config.sweep_interval = Duration::from_secs(settings.chat.sweep_interval_secs);

    println!("Joining thread '{thread}' at {base_url}");
    let mut handle = ChatPanel::start(config, transport, messages);

    // Render task: print whatever changed since the last snapshot.
    let mut watcher = handle.watch();
    let json = cli.json;
    let render = tokio::spawn(async move {
        let mut last = Rendered::default();
        loop {
            let snapshot = watcher.borrow_and_update().clone();
            render_snapshot(&snapshot, &mut last, json);
            if watcher.changed().await.is_err() {
                break;
            }
        }
    });

    // Input loop: one message per line.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) if line.trim() == "/quit" => break,
                Some(line) => {
                    if let Err(err) = handle.submit(&line).await {
                        eprintln!("! {err}");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.stop().await;
    render.abort();
    println!("Disconnected.");
    Ok(())
}

fn print_mailbox(list: &[MailboxMessage], badge: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(list)?);
        return Ok(());
    }

    if list.is_empty() {
        println!("(empty)");
        return Ok(());
    }
    for msg in list {
        let id = msg.id.as_deref().unwrap_or("-");
        let mut line = format!("[{id}] {}", msg.subject);
        if msg.is_unread() {
            line.push_str(&format!(" ({badge})"));
        }
        println!("{line}");
        if let Some(from) = &msg.from_email {
            println!("    from: {from}");
        }
        if let Some(to) = &msg.to_email {
            println!("    to: {to}");
        }
        let preview: String = msg.body.chars().take(140).collect();
        if !preview.is_empty() {
            println!("    {preview}");
        }
    }
    let unread = list.iter().filter(|m| m.is_unread()).count();
    println!("{} message(s), {} {}", list.len(), unread, badge);
    Ok(())
}

#[derive(Default)]
struct Rendered {
    message_count: usize,
    connection: Option<ConnectionState>,
    composing: bool,
}

fn render_snapshot(snapshot: &PanelSnapshot, last: &mut Rendered, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(snapshot) {
            println!("{line}");
        }
        return;
    }

    if last.connection != Some(snapshot.connection) {
        last.connection = Some(snapshot.connection);
        match snapshot.connection {
            ConnectionState::Open => println!("* connected"),
            ConnectionState::Reconnecting => println!(
                "* connection lost, retrying (attempt {})",
                snapshot.reconnect_attempt
            ),
            ConnectionState::Connecting => println!("* connecting..."),
            ConnectionState::Closed => println!("* closed"),
        }
    }

    for message in snapshot.messages.iter().skip(last.message_count) {
        let who = match message.sender_kind {
            SenderKind::User => "you",
            SenderKind::Agent => "agent",
        };
        let marker = if message.failed {
            " [failed]"
        } else if message.pending {
            " [sending]"
        } else {
            ""
        };
        println!(
            "[{}] {}: {}{}",
            message.created_at.format("%H:%M:%S"),
            who,
            message.text,
            marker
        );
    }
    last.message_count = snapshot.messages.len();

    if snapshot.status.responder_composing && !last.composing {
        println!("* responder is typing...");
    }
    last.composing = snapshot.status.responder_composing;
}
