//! Task list
//!
//! Same shape as notes: pure functions from the current list to the next one.

use serde::{Deserialize, Serialize};

use crate::notes::generate_id;

pub const DEFAULT_TARGET_POMODOROS: u32 = 4;

fn default_target() -> u32 {
    DEFAULT_TARGET_POMODOROS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Pomodoros spent so far
    #[serde(default)]
    pub pomodoros: u32,
    #[serde(default = "default_target")]
    pub target_pomodoros: u32,
    /// Epoch milliseconds
    #[serde(default)]
    pub created_at: i64,
}

impl Task {
    pub fn reached_target(&self) -> bool {
        self.pomodoros >= self.target_pomodoros
    }
}

/// New open task at the front of the list
pub fn add(tasks: &[Task], title: &str, now_ms: i64) -> Option<Vec<Task>> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    let task = Task {
        id: generate_id(now_ms, tasks.iter().map(|t| t.id.as_str())),
        title: title.to_string(),
        completed: false,
        pomodoros: 0,
        target_pomodoros: DEFAULT_TARGET_POMODOROS,
        created_at: now_ms,
    };

    let mut next = Vec::with_capacity(tasks.len() + 1);
    next.push(task);
    next.extend(tasks.iter().cloned());
    Some(next)
}

fn map_one(tasks: &[Task], id: &str, f: impl Fn(&Task) -> Task) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| if t.id == id { f(t) } else { t.clone() })
        .collect()
}

pub fn toggle(tasks: &[Task], id: &str) -> Vec<Task> {
    map_one(tasks, id, |t| Task {
        completed: !t.completed,
        ..t.clone()
    })
}

pub fn rename(tasks: &[Task], id: &str, title: &str) -> Option<Vec<Task>> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    Some(map_one(tasks, id, |t| Task {
        title: title.to_string(),
        ..t.clone()
    }))
}

/// One more pomodoro on an open task; completed tasks are left alone
pub fn increment_pomodoro(tasks: &[Task], id: &str) -> Vec<Task> {
    map_one(tasks, id, |t| {
        if t.completed {
            t.clone()
        } else {
            Task {
                pomodoros: t.pomodoros.saturating_add(1),
                ..t.clone()
            }
        }
    })
}

pub fn delete(tasks: &[Task], id: &str) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != id).cloned().collect()
}

pub fn clear_completed(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.completed).cloned().collect()
}

pub fn completed_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.completed).count()
}

/// Unique task whose id starts with `prefix`
pub fn find_by_prefix<'a>(tasks: &'a [Task], prefix: &str) -> Option<&'a Task> {
    let mut matches = tasks.iter().filter(|t| t.id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Some(task),
        _ => tasks.iter().find(|t| t.id == prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_task_defaults() {
        let tasks = add(&[], "Write report", 1_000).unwrap();
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        assert_eq!(task.title, "Write report");
        assert!(!task.completed);
        assert_eq!(task.pomodoros, 0);
        assert_eq!(task.target_pomodoros, 4);
    }

    #[test]
    fn test_pomodoro_then_complete_then_no_more_pomodoros() {
        let tasks = add(&[], "Write report", 1_000).unwrap();
        let id = tasks[0].id.clone();

        let tasks = increment_pomodoro(&tasks, &id);
        assert_eq!(tasks[0].pomodoros, 1);

        let tasks = toggle(&tasks, &id);
        assert!(tasks[0].completed);

        let tasks = increment_pomodoro(&tasks, &id);
        let tasks = increment_pomodoro(&tasks, &id);
        assert_eq!(tasks[0].pomodoros, 1);

        // Reopened tasks count again
        let tasks = increment_pomodoro(&toggle(&tasks, &id), &id);
        assert_eq!(tasks[0].pomodoros, 2);
    }

    #[test]
    fn test_blank_titles_are_refused() {
        assert!(add(&[], "  ", 1_000).is_none());
        let tasks = add(&[], "x", 1_000).unwrap();
        assert!(rename(&tasks, &tasks[0].id, "").is_none());
        assert_eq!(rename(&tasks, &tasks[0].id, " y ").unwrap()[0].title, "y");
    }

    #[test]
    fn test_clear_completed_and_counts() {
        let tasks = add(&[], "a", 1).unwrap();
        let tasks = add(&tasks, "b", 2).unwrap();
        let tasks = add(&tasks, "c", 3).unwrap();
        let tasks = toggle(&toggle(&tasks, "1"), "3");

        assert_eq!(completed_count(&tasks), 2);
        let open = clear_completed(&tasks);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "b");

        assert_eq!(delete(&tasks, "2").len(), 2);
    }

    #[test]
    fn test_missing_optional_fields_decode() {
        let raw = r#"{"id": "1", "title": "old", "createdAt": 5}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.target_pomodoros, 4);
        assert!(!task.completed);
        assert!(!task.reached_target());
    }

    #[test]
    fn test_pomodoro_count_saturates() {
        let tasks = vec![Task {
            pomodoros: u32::MAX,
            ..add(&[], "long haul", 1).unwrap().remove(0)
        }];
        let tasks = increment_pomodoro(&tasks, "1");
        assert_eq!(tasks[0].pomodoros, u32::MAX);
    }
}
