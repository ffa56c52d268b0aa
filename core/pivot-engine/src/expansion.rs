//! FILENAME: core/pivot-engine/src/expansion.rs
//! Expansion State - which nodes are open.
//!
//! Every node is closed unless its key is in the set. Keys only enter the
//! set through an explicit toggle or `open_path` (drill-through); the
//! projector's search auto-expansion never writes here.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::tree::node_key;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpansionState {
    open: FxHashSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        ExpansionState::default()
    }

    pub fn is_open(&self, key: &str) -> bool {
        self.open.contains(key)
    }

    /// Flips a node; returns whether it is open afterwards.
    pub fn toggle(&mut self, key: &str) -> bool {
        if self.open.remove(key) {
            false
        } else {
            self.open.insert(key.to_string());
            true
        }
    }

    pub fn open(&mut self, key: impl Into<String>) {
        self.open.insert(key.into());
    }

    pub fn close(&mut self, key: &str) {
        self.open.remove(key);
    }

    /// Opens every prefix of `path` so the tree renders expanded down to
    /// the node at its end.
    pub fn open_path<S: AsRef<str>>(&mut self, path: &[S]) {
        for end in 1..=path.len() {
            self.open.insert(node_key(&path[..end]));
        }
    }

    pub fn clear(&mut self) {
        self.open.clear();
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
