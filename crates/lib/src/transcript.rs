//! Append-only transcript of displayed messages.
//!
//! Entries are never edited once appended. The only removal allowed is of a
//! transient [`Category::Loading`] entry once the operation it announces resolves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position-independent id of a transcript entry. Increases with every append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    System,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Normal,
    Error,
    Success,
    Loading,
}

/// One displayed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub sender: Sender,
    pub text: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

/// Ordered list of entries in arrival order.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return a copy of it.
    pub fn append(&mut self, sender: Sender, text: impl Into<String>, category: Category) -> Entry {
        let entry = Entry {
            id: EntryId(self.next_id),
            sender,
            text: text.into(),
            category,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.entries.push(entry.clone());
        entry
    }

    /// Remove a loading entry. Returns false (and removes nothing) if `id` is
    /// unknown or names an entry of any other category.
    pub fn remove_loading(&mut self, id: EntryId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(i) if self.entries[i].category == Category::Loading => {
                self.entries.remove(i);
                true
            }
            _ => false,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
