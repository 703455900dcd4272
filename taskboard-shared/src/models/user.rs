/// User model
///
/// A user owns an ordered, duplicate-free list of pending task ids. That list
/// mirrors `Task::assigned_user` on the other side and is kept in sync by
/// [`crate::reconcile::AssignmentReconciler`], never by the store.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
///     pending_tasks UUID[] NOT NULL DEFAULT '{}',
///     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```
/// use taskboard_shared::models::user::User;
///
/// let user = User::new("Alice", "a@x.com", Vec::new());
/// assert!(user.pending_tasks.is_empty());
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Display name, copied onto assigned tasks as `assignedUserName`
    pub name: String,

    /// Email address, unique across users
    pub email: String,

    /// Ids of tasks assigned to this user and not completed
    #[serde(rename = "pendingTasks")]
    pub pending_tasks: Vec<Uuid>,

    /// When the user was created
    #[serde(rename = "dateCreated")]
    pub date_created: DateTime<Utc>,
}

/// Input for creating or replacing a user
///
/// `pending_tasks` must already be normalized (see
/// [`crate::validation::sanitize_id_list`]).
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub pending_tasks: Vec<Uuid>,
}

impl User {
    /// Builds a new user with a fresh id
    pub fn new(name: impl Into<String>, email: impl Into<String>, pending_tasks: Vec<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            pending_tasks,
            date_created: Utc::now(),
        }
    }

    /// Whether `task_id` is in this user's pending list
    pub fn has_pending(&self, task_id: Uuid) -> bool {
        self.pending_tasks.contains(&task_id)
    }

    /// Appends `task_id` unless already present. Returns true if the list changed.
    pub fn add_pending(&mut self, task_id: Uuid) -> bool {
        if self.has_pending(task_id) {
            return false;
        }
        self.pending_tasks.push(task_id);
        true
    }

    /// Removes every occurrence of `task_id`. Returns true if the list changed.
    pub fn pull_pending(&mut self, task_id: Uuid) -> bool {
        let before = self.pending_tasks.len();
        self.pending_tasks.retain(|id| *id != task_id);
        before != self.pending_tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_pending_is_set_like() {
        let task_id = Uuid::new_v4();
        let mut user = User::new("Alice", "a@x.com", Vec::new());

        assert!(user.add_pending(task_id));
        assert!(!user.add_pending(task_id));
        assert_eq!(user.pending_tasks, vec![task_id]);
    }

    #[test]
    fn test_pull_pending() {
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();
        let mut user = User::new("Alice", "a@x.com", vec![keep, drop]);

        assert!(user.pull_pending(drop));
        assert!(!user.pull_pending(drop));
        assert_eq!(user.pending_tasks, vec![keep]);
    }

    #[test]
    fn test_serializes_with_document_field_names() {
        let user = User::new("Alice", "a@x.com", Vec::new());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["_id"], user.id.to_string());
        assert_eq!(json["pendingTasks"], serde_json::json!([]));
        assert!(json.get("dateCreated").is_some());
    }
}
