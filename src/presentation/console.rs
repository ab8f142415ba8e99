//! Console Front-end
//!
//! Line-oriented chat page. Each stdin line is composed and submitted as if
//! typed and confirmed with Enter. Lines starting with `/` are commands:
//!
//! - `/history`: load the page before the oldest loaded message
//! - `/metrics`: print the Prometheus metrics
//! - `/quit`: leave the chat

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::services::{
    ChatSession, ChatUpdate, ConnectionState, Key, KeyOutcome, KeyPress,
};
use crate::domain::entities::{Connector, LinkEvent, MessageKind, MessageView};
use crate::infrastructure::metrics;

/// A parsed stdin line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Compose(String),
    History,
    Metrics,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "/history" => Self::History,
            "/metrics" => Self::Metrics,
            "/quit" | "/exit" => Self::Quit,
            _ => Self::Compose(line.to_string()),
        }
    }
}

/// Render one message as `[HH:MM] name: content`; own messages are marked.
pub fn format_message(view: &MessageView<'_>) -> String {
    let marker = match view.kind {
        MessageKind::Send => " (me)",
        MessageKind::Receive => "",
    };
    format!(
        "[{}] {}{}: {}",
        view.message.display_time(),
        view.message.sender.name,
        marker,
        view.message.content
    )
}

/// Lines to print for a session update.
pub fn render_update<C: Connector>(session: &ChatSession<C>, update: &ChatUpdate) -> Vec<String> {
    match update {
        ChatUpdate::Ready { session: number } => {
            vec![format!("-- connected (session {}) --", number)]
        }
        ChatUpdate::SubscribeFailed { session: number } => {
            vec![format!("-- connected (session {}) but subscribing failed --", number)]
        }
        ChatUpdate::Lost => vec!["-- connection lost, reconnecting --".to_string()],
        ChatUpdate::Appended { .. } => session
            .views()
            .last()
            .map(format_message)
            .into_iter()
            .collect(),
        ChatUpdate::HistoryLoaded { count, cursor } => {
            let mut lines = vec![format!("-- {} older messages --", count)];
            lines.extend(session.views().iter().take(*count).map(format_message));
            if cursor.end {
                lines.push("-- start of conversation --".to_string());
            }
            lines
        }
        ChatUpdate::Dropped | ChatUpdate::Ignored => Vec::new(),
    }
}

/// Run the chat page until `/quit`, end of input, Ctrl-C or a link that
/// stops for good. The session is torn down on return.
pub async fn run<C: Connector>(
    mut session: ChatSession<C>,
    mut events: mpsc::UnboundedReceiver<LinkEvent>,
) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    tracing::info!("Link event stream ended");
                    break;
                };
                let update = session.handle_event(event);
                print_lines(&mut out, &render_update(&session, &update))?;
                if session.state() == ConnectionState::Disconnected {
                    print_lines(&mut out, &["-- disconnected --".to_string()])?;
                    break;
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match ConsoleCommand::parse(&line) {
                    ConsoleCommand::Quit => break,
                    ConsoleCommand::History => {
                        if !session.request_older() {
                            print_lines(&mut out, &["-- no older messages to load --".to_string()])?;
                        }
                    }
                    ConsoleCommand::Metrics => {
                        print_lines(&mut out, &[metrics::gather_metrics()])?;
                    }
                    ConsoleCommand::Compose(text) => {
                        session.set_input(text);
                        if let KeyOutcome::Submitted { sent: false } =
                            session.handle_key(KeyPress::new(Key::Enter))
                        {
                            tracing::debug!(state = %session.state(), "Message not sent");
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    session.teardown();
    Ok(())
}

fn print_lines(out: &mut impl Write, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}
