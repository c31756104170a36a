//! Incremental reveal of transcript text, one character per tick.
//!
//! Each reveal is a tokio task bound to one transcript entry. Starting a reveal for
//! an entry that already has one aborts the earlier task; frames carry a
//! generation so a surface can drop stale frames still queued from it. Reveals of
//! different entries run independently.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::transcript::EntryId;

/// Progress of one reveal: the first `visible` characters of the entry are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealFrame {
    pub entry: EntryId,
    pub generation: u64,
    pub visible: usize,
    pub total: usize,
}

impl RevealFrame {
    pub fn is_done(&self) -> bool {
        self.visible >= self.total
    }
}

struct Running {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Owns the running reveal tasks and the sending side of their frame channel.
pub struct Revealer {
    interval: Duration,
    running: HashMap<EntryId, Running>,
    next_generation: u64,
    tx: mpsc::UnboundedSender<RevealFrame>,
}

impl Revealer {
    /// New revealer with the given per-character interval. A zero interval shows
    /// text in full immediately.
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<RevealFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let revealer = Self {
            interval,
            running: HashMap::new(),
            next_generation: 0,
            tx,
        };
        (revealer, rx)
    }

    /// Start revealing `text` for `entry`, replacing any reveal already running for it.
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, entry: EntryId, text: &str) -> u64 {
        self.cancel(entry);
        let generation = self.next_generation;
        self.next_generation += 1;
        let total = text.chars().count();

        if self.interval.is_zero() || total == 0 {
            let _ = self.tx.send(RevealFrame {
                entry,
                generation,
                visible: total,
                total,
            });
            self.running.insert(
                entry,
                Running {
                    generation,
                    handle: None,
                },
            );
            return generation;
        }

        let tx = self.tx.clone();
        let interval = self.interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            for visible in 1..=total {
                ticker.tick().await;
                let frame = RevealFrame {
                    entry,
                    generation,
                    visible,
                    total,
                };
                if tx.send(frame).is_err() {
                    break;
                }
            }
        });
        self.running.insert(
            entry,
            Running {
                generation,
                handle: Some(handle),
            },
        );
        generation
    }

    /// Abort the reveal for `entry`. Returns true if one was tracked.
    pub fn cancel(&mut self, entry: EntryId) -> bool {
        match self.running.remove(&entry) {
            Some(r) => {
                if let Some(h) = r.handle {
                    h.abort();
                }
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, r) in self.running.drain() {
            if let Some(h) = r.handle {
                h.abort();
            }
        }
    }

    /// True if `frame` belongs to the current reveal of its entry. A final frame
    /// also stops tracking the entry.
    pub fn accept(&mut self, frame: &RevealFrame) -> bool {
        let current = self
            .running
            .get(&frame.entry)
            .is_some_and(|r| r.generation == frame.generation);
        if current && frame.is_done() {
            self.running.remove(&frame.entry);
        }
        current
    }

    /// True while `entry` has a reveal that has not delivered its final frame.
    pub fn is_revealing(&self, entry: EntryId) -> bool {
        self.running.contains_key(&entry)
    }
}

impl Drop for Revealer {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// The first `visible` characters of `text`, cut on a char boundary.
pub fn visible_prefix(text: &str, visible: usize) -> &str {
    match text.char_indices().nth(visible) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
