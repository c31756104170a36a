//! Interactive chat loop.
//!
//! Until a channel has been processed, input lines are channel names; afterwards
//! they are chat messages. `/channel <name>` switches channel at any time.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use lib::backend::HttpBackend;
use lib::reveal::Revealer;
use lib::session::{ChatError, ChatSession, SessionEvent};

use crate::render::TerminalView;

const HELP: &str = "available commands:\n\n/channel <name> - process a channel and start a new session\n/help - show this help message\n/exit - leave";

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Activate(String),
    Send(String),
}

pub async fn run_chat(
    config_path: Option<PathBuf>,
    backend_url: Option<String>,
    channel: Option<String>,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let url = backend_url.unwrap_or_else(|| lib::config::resolve_backend_url(&config));
    let backend = HttpBackend::new(url, config.backend.request_timeout())?;
    log::info!("using backend {}", backend.base_url());
    let session = ChatSession::new(Arc::new(backend), config.channels.clone());

    let interval = if config.reveal.enabled {
        config.reveal.interval()
    } else {
        Duration::ZERO
    };
    let (revealer, frames) = Revealer::new(interval);
    let mut view = TerminalView::new(revealer, frames);
    let mut events = session.subscribe();

    if let Some(name) = channel {
        run_action(&session, &mut events, &mut view, Action::Activate(name)).await?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let prompt = if session.session_id().is_some() {
            "> "
        } else {
            "channel> "
        };
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if input.eq_ignore_ascii_case("/help") {
            println!("{}", HELP);
            continue;
        }
        let action = parse_action(input, session.session_id().is_some());
        run_action(&session, &mut events, &mut view, action).await?;
    }

    Ok(())
}

/// Map an input line to an operation. Without a session, plain lines name a channel.
fn parse_action(input: &str, has_session: bool) -> Action {
    match input.strip_prefix("/channel") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => Action::Activate(rest.to_string()),
        _ if !has_session => Action::Activate(input.to_string()),
        _ => Action::Send(input.to_string()),
    }
}

/// Run one operation while rendering its events as they arrive.
async fn run_action(
    session: &ChatSession,
    events: &mut tokio::sync::broadcast::Receiver<SessionEvent>,
    view: &mut TerminalView,
    action: Action,
) -> anyhow::Result<()> {
    let op = {
        let session = session.clone();
        tokio::spawn(async move {
            match action {
                Action::Activate(name) => session.activate_channel(&name).await.map(|_| ()),
                Action::Send(text) => session.send_message(&text).await.map(|_| ()),
            }
        })
    };
    tokio::pin!(op);

    let result = loop {
        tokio::select! {
            ev = events.recv() => match ev {
                Ok(ev) => view.handle(ev).await?,
                Err(RecvError::Lagged(n)) => log::debug!("renderer lagged {} event(s)", n),
                Err(RecvError::Closed) => {}
            },
            res = &mut op => break res?,
        }
    };

    // Events published just before the operation finished.
    loop {
        match events.try_recv() {
            Ok(ev) => view.handle(ev).await?,
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(n)) => {
                log::debug!("renderer lagged {} event(s)", n)
            }
            Err(_) => break,
        }
    }

    match result {
        Ok(()) => {}
        Err(ChatError::Busy(op)) => println!("{} in progress, please wait", op),
        Err(e) => log::debug!("operation finished with error: {}", e),
    }
    Ok(())
}
