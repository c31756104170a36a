//! Terminal rendering of transcript events.

use std::io::{self, Write};
use tokio::sync::mpsc;

use lib::reveal::{visible_prefix, RevealFrame, Revealer};
use lib::session::SessionEvent;
use lib::transcript::{Category, Entry, Sender};

/// Prints entries as they are appended; bot replies go through the reveal.
pub struct TerminalView {
    revealer: Revealer,
    frames: mpsc::UnboundedReceiver<RevealFrame>,
}

impl TerminalView {
    pub fn new(revealer: Revealer, frames: mpsc::UnboundedReceiver<RevealFrame>) -> Self {
        Self { revealer, frames }
    }

    pub async fn handle(&mut self, event: SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::Appended(entry) => self.show(&entry).await,
            SessionEvent::Removed(_) => Ok(()),
            SessionEvent::Controls(c) => {
                log::debug!(
                    "controls: channel={} message={}",
                    c.channel_input_enabled,
                    c.message_input_enabled
                );
                Ok(())
            }
        }
    }

    async fn show(&mut self, entry: &Entry) -> io::Result<()> {
        match (entry.sender, entry.category) {
            // Echoed by the terminal already.
            (Sender::User, _) => Ok(()),
            (Sender::Bot, _) => self.reveal(entry).await,
            (_, Category::Error) => {
                eprintln!("! {}", entry.text);
                Ok(())
            }
            (_, Category::Loading) => {
                println!("… {}", entry.text);
                Ok(())
            }
            (_, Category::Success) => {
                println!("✓ {}", entry.text);
                Ok(())
            }
            (_, Category::Normal) => {
                println!("{}", entry.text);
                Ok(())
            }
        }
    }

    /// Print a bot entry character by character; returns once it is fully shown.
    async fn reveal(&mut self, entry: &Entry) -> io::Result<()> {
        let mut stdout = io::stdout();
        write!(stdout, "< ")?;
        stdout.flush()?;
        self.revealer.start(entry.id, &entry.text);
        let mut shown = 0;
        while let Some(frame) = self.frames.recv().await {
            if frame.entry != entry.id || !self.revealer.accept(&frame) {
                continue;
            }
            let prefix = visible_prefix(&entry.text, frame.visible);
            let already = visible_prefix(&entry.text, shown).len();
            write!(stdout, "{}", &prefix[already..])?;
            stdout.flush()?;
            shown = frame.visible;
            if frame.is_done() {
                break;
            }
        }
        writeln!(stdout)?;
        Ok(())
    }
}
