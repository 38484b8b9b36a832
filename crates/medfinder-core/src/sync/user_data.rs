//! Per-user state that travels between devices

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reading progress for one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub completed: bool,
    pub last_visited: DateTime<Utc>,
}

/// Bookmarks, notes, progress and preferences keyed by module id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    pub bookmarks: BTreeSet<String>,
    pub notes: BTreeMap<String, String>,
    pub progress: BTreeMap<String, Progress>,
    pub preferences: BTreeMap<String, serde_json::Value>,
}

impl UserData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
            && self.notes.is_empty()
            && self.progress.is_empty()
            && self.preferences.is_empty()
    }

    pub fn visit(&mut self, module_id: &str, completed: bool, at: DateTime<Utc>) {
        let entry = self
            .progress
            .entry(module_id.to_string())
            .or_insert(Progress {
                completed: false,
                last_visited: at,
            });
        entry.completed |= completed;
        if at > entry.last_visited {
            entry.last_visited = at;
        }
    }

    /// Fold `remote` into this copy; returns whether anything changed.
    ///
    /// - bookmarks: union
    /// - notes: the longer text wins, ties keep the local one
    /// - progress: `completed` is OR-ed, the later visit is kept
    /// - preferences: local values stay, missing keys come from remote
    pub fn merge(&mut self, remote: &UserData) -> bool {
        let mut changed = false;

        for bookmark in &remote.bookmarks {
            changed |= self.bookmarks.insert(bookmark.clone());
        }

        // Length stands in for "more complete"; edits that shorten a note lose.
        for (id, note) in &remote.notes {
            match self.notes.get(id) {
                Some(local) if local.chars().count() >= note.chars().count() => {}
                _ => {
                    self.notes.insert(id.clone(), note.clone());
                    changed = true;
                }
            }
        }

        for (id, theirs) in &remote.progress {
            match self.progress.get_mut(id) {
                Some(ours) => {
                    if theirs.completed && !ours.completed {
                        ours.completed = true;
                        changed = true;
                    }
                    if theirs.last_visited > ours.last_visited {
                        ours.last_visited = theirs.last_visited;
                        changed = true;
                    }
                }
                None => {
                    self.progress.insert(id.clone(), theirs.clone());
                    changed = true;
                }
            }
        }

        for (key, value) in &remote.preferences {
            if !self.preferences.contains_key(key) {
                self.preferences.insert(key.clone(), value.clone());
                changed = true;
            }
        }

        changed
    }
}
