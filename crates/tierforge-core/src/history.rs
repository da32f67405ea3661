//! Undo/Redo History
//!
//! Bounded list of board snapshots (tier sequences plus the unranked pool
//! order) and a cursor.
//!
//! # Invariants
//!
//! 1. A snapshot is recorded *before* a structural mutation is applied.
//! 2. Recording while the cursor is behind the tip discards the redo tail
//!    (no branching history).
//! 3. Recorded entries never exceed `cap`; the oldest is evicted first.
//! 4. `undo` at the tip pushes a synthetic "current" checkpoint so that
//!    `redo` can return to the unsaved present. That checkpoint may make
//!    `len()` read `cap + 1` until the next mutation truncates it.
//!
//! ```text
//! record(a) record(b)      entries: [a, b]           cursor: 1
//! undo()                   entries: [a, b, current]  cursor: 0  (restores b)
//! undo()                   entries: [a, b, current]  cursor: -1 (restores a)
//! redo()                   entries: [a, b, current]  cursor: 0  (restores b)
//! record(c)                entries: [a, c]           cursor: 1
//! ```

use std::collections::VecDeque;

use web_time::{SystemTime, UNIX_EPOCH};

use crate::models::{ItemId, Tier};

/// Default maximum number of recorded mutations
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// Label of the synthetic checkpoint pushed by `undo`
pub const CURRENT_ACTION: &str = "current";

/// Deep copy of the placement state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub tiers: Vec<Tier>,
    pub unranked: Vec<ItemId>,
}

impl Snapshot {
    pub fn new(tiers: &[Tier], unranked: &[ItemId]) -> Self {
        Self {
            tiers: tiers.to_vec(),
            unranked: unranked.to_vec(),
        }
    }
}

/// One history point
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    pub timestamp_ms: u64,
    pub action: String,
}

impl HistoryEntry {
    fn new(snapshot: Snapshot, action: &str) -> Self {
        Self {
            snapshot,
            timestamp_ms: now_ms(),
            action: action.to_string(),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    /// Index of the entry the next `undo` restores; -1 when nothing to undo
    cursor: isize,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl History {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: -1,
            cap: cap.max(1),
        }
    }

    /// Store the board as it stands before the mutation labelled `action`.
    pub fn record(&mut self, snapshot: Snapshot, action: &str) {
        let keep = (self.cursor + 1) as usize;
        if keep < self.entries.len() {
            self.entries.truncate(keep);
        }

        self.entries.push_back(HistoryEntry::new(snapshot, action));

        if self.entries.len() > self.cap {
            self.entries.pop_front();
        } else {
            self.cursor += 1;
        }
    }

    /// Step back. `current` is the live board, kept as a redo checkpoint
    /// when undoing from the tip.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        if self.cursor < 0 {
            return None;
        }
        if self.cursor as usize == self.entries.len() - 1 {
            self.entries.push_back(HistoryEntry::new(current, CURRENT_ACTION));
        }
        let restored = self.entries[self.cursor as usize].snapshot.clone();
        self.cursor -= 1;
        Some(restored)
    }

    pub fn redo(&mut self) -> Option<Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[(self.cursor + 1) as usize].snapshot.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len() as isize - 2
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Label of the mutation the next `undo` reverts
    pub fn undo_label(&self) -> Option<&str> {
        if self.cursor < 0 {
            return None;
        }
        self.entries.get(self.cursor as usize).map(|e| e.action.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = -1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(tag: &str) -> Snapshot {
        Snapshot::new(&[Tier::new(tag, tag, "#fff", 0)], &[])
    }

    fn tag(snapshot: &Snapshot) -> &str {
        &snapshot.tiers[0].id
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new(10);
        history.record(board("a"), "m1");
        history.record(board("b"), "m2");

        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert_eq!(tag(&history.undo(board("c")).unwrap()), "b");
        assert_eq!(history.len(), 3);
        assert_eq!(tag(&history.undo(board("b")).unwrap()), "a");
        assert!(!history.can_undo());
        assert!(history.undo(board("a")).is_none());

        assert_eq!(tag(&history.redo().unwrap()), "b");
        assert_eq!(tag(&history.redo().unwrap()), "c");
        assert!(!history.can_redo());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_after_undo_discards_redo_tail() {
        let mut history = History::new(10);
        history.record(board("a"), "m1");
        history.record(board("b"), "m2");
        history.undo(board("c"));

        history.record(board("b2"), "m3");
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        let actions: Vec<&str> = history.entries().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["m1", "m3"]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.record(board(&format!("t{i}")), &format!("m{i}"));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.entries().next().unwrap().action, "m2");

        // Undo as far as possible lands on the oldest retained snapshot.
        let mut last = None;
        while let Some(restored) = history.undo(board("live")) {
            last = Some(restored);
        }
        assert_eq!(tag(&last.unwrap()), "t2");
    }

    #[test]
    fn test_undo_label() {
        let mut history = History::new(5);
        assert_eq!(history.undo_label(), None);
        history.record(board("a"), "ITEM_MOVED");
        assert_eq!(history.undo_label(), Some("ITEM_MOVED"));
    }

    #[test]
    fn test_clear() {
        let mut history = History::new(5);
        history.record(board("a"), "m");
        history.clear();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
