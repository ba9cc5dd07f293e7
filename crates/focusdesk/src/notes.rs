//! Notes
//!
//! Every operation returns a fresh sequence; callers hand it to the
//! workspace, which replaces the stored list wholesale. Blank input is
//! refused by returning `None`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Note {
    pub id: String,
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Epoch milliseconds
    pub updated_at: i64,
}

/// Millisecond timestamp id, bumped until it is unique among `existing`
pub fn generate_id<'a>(now_ms: i64, existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let mut candidate = now_ms;
    loop {
        let id = candidate.to_string();
        if !existing.clone().any(|e| e == id) {
            return id;
        }
        candidate += 1;
    }
}

/// New note at the front of the list
pub fn add(notes: &[Note], content: &str, now_ms: i64) -> Option<Vec<Note>> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    let note = Note {
        id: generate_id(now_ms, notes.iter().map(|n| n.id.as_str())),
        content: content.to_string(),
        created_at: now_ms,
        updated_at: now_ms,
    };

    let mut next = Vec::with_capacity(notes.len() + 1);
    next.push(note);
    next.extend(notes.iter().cloned());
    Some(next)
}

/// Replace a note's content, refreshing `updated_at`
pub fn update(notes: &[Note], id: &str, content: &str, now_ms: i64) -> Option<Vec<Note>> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }

    Some(
        notes
            .iter()
            .map(|n| {
                if n.id == id {
                    Note {
                        content: content.to_string(),
                        updated_at: now_ms,
                        ..n.clone()
                    }
                } else {
                    n.clone()
                }
            })
            .collect(),
    )
}

pub fn delete(notes: &[Note], id: &str) -> Vec<Note> {
    notes.iter().filter(|n| n.id != id).cloned().collect()
}

/// Unique note whose id starts with `prefix`
pub fn find_by_prefix<'a>(notes: &'a [Note], prefix: &str) -> Option<&'a Note> {
    let mut matches = notes.iter().filter(|n| n.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(note), None) => Some(note),
        _ => notes.iter().find(|n| n.id == prefix),
    }
}
