/// Task model
///
/// A task has at most one assignee. `assigned_user_name` is a denormalized
/// copy of that user's name, or [`UNASSIGNED`] when there is no assignee.
///
/// On the wire an unassigned task carries `"assignedUser": ""`; in Rust it is
/// `None`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     deadline TIMESTAMPTZ NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     assigned_user UUID,
///     assigned_user_name TEXT NOT NULL DEFAULT 'unassigned',
///     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cached assignee name for tasks without an assignee
pub const UNASSIGNED: &str = "unassigned";

/// Task document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID (UUID v4)
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Task name
    pub name: String,

    /// Free-form description, empty when not given
    pub description: String,

    /// Due date
    pub deadline: DateTime<Utc>,

    /// Completed tasks are never pending for anyone
    pub completed: bool,

    /// Assignee id, `None` when unassigned
    #[serde(rename = "assignedUser", with = "assignee_id")]
    pub assigned_user: Option<Uuid>,

    /// Assignee display name or `"unassigned"`
    #[serde(rename = "assignedUserName")]
    pub assigned_user_name: String,

    /// When the task was created
    #[serde(rename = "dateCreated")]
    pub date_created: DateTime<Utc>,
}

/// Input for creating or replacing a task
///
/// The assignee is resolved separately by the task service.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub name: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub completed: bool,
    pub assigned_user: Option<Uuid>,
}

impl Task {
    /// Builds a new unassigned task with a fresh id
    pub fn new(name: impl Into<String>, deadline: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            deadline,
            completed: false,
            assigned_user: None,
            assigned_user_name: UNASSIGNED.to_string(),
            date_created: Utc::now(),
        }
    }

    /// Points the task at `user`, refreshing the cached name
    pub fn assign_to(&mut self, user: &User) {
        self.assigned_user = Some(user.id);
        self.assigned_user_name = user.name.clone();
    }

    /// Clears the assignee
    pub fn unassign(&mut self) {
        self.assigned_user = None;
        self.assigned_user_name = UNASSIGNED.to_string();
    }
}

/// Serializes `Option<Uuid>` as `""` / `"<uuid>"`
mod assignee_id {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(value: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_str(&id.to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        Uuid::parse_str(trimmed).map(Some).map_err(D::Error::custom)
    }
}
