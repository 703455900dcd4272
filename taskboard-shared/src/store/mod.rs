/// Document store collaborator
///
/// The reconciler and services only talk to storage through the [`Store`]
/// trait. It mirrors a document database's CRUD surface: find, find-by-id,
/// count, update-many with element/field patches, delete, and save (upsert a
/// whole document).
///
/// Filters are closed, typed vocabularies ([`UserFilter`], [`TaskFilter`]);
/// callers cannot smuggle arbitrary query operators through to the backend.
///
/// # Implementations
///
/// - [`memory::MemoryStore`]: in-process, used without a database and in tests
/// - [`postgres::PgStore`]: PostgreSQL via sqlx
///
/// # Consistency
///
/// No method spans both collections and nothing here is transactional across
/// calls. Each call is atomic on its own.

pub mod memory;
pub mod postgres;

use crate::models::{Task, User};
use async_trait::async_trait;
use std::cmp::Ordering;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("Duplicate value for unique field '{field}'")]
    Duplicate {
        /// Field whose uniqueness was violated (e.g. "email")
        field: String,
    },

    /// Database driver error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// SQL keyword
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// One sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

/// Sort, skip and limit applied to a find
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions<F> {
    /// Sort keys, most significant first
    pub sort: Vec<SortKey<F>>,

    /// Number of matching documents to skip
    pub skip: Option<u64>,

    /// Maximum number of documents to return
    pub limit: Option<u64>,
}

impl<F> Default for FindOptions<F> {
    fn default() -> Self {
        Self {
            sort: Vec::new(),
            skip: None,
            limit: None,
        }
    }
}

impl<F: Copy> FindOptions<F> {
    /// Sorts `docs` in place by the configured keys, then applies skip/limit
    pub fn apply<T>(&self, mut docs: Vec<T>, compare: impl Fn(F, &T, &T) -> Ordering) -> Vec<T> {
        if !self.sort.is_empty() {
            // Stable sort keeps natural (insertion) order among ties
            docs.sort_by(|a, b| {
                self.sort
                    .iter()
                    .map(|key| key.direction.apply(compare(key.field, a, b)))
                    .find(|ordering| *ordering != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = self
            .skip
            .map_or(0, |skip| usize::try_from(skip).unwrap_or(usize::MAX));
        let limit = self
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        docs.into_iter().skip(skip).take(limit).collect()
    }
}

/// Sortable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Id,
    Name,
    Email,
    DateCreated,
}

impl UserSortField {
    /// Backing column name
    pub fn column(self) -> &'static str {
        match self {
            UserSortField::Id => "id",
            UserSortField::Name => "name",
            UserSortField::Email => "email",
            UserSortField::DateCreated => "date_created",
        }
    }

    /// Compares two users on this field
    pub fn compare(self, a: &User, b: &User) -> Ordering {
        match self {
            UserSortField::Id => a.id.cmp(&b.id),
            UserSortField::Name => a.name.cmp(&b.name),
            UserSortField::Email => a.email.cmp(&b.email),
            UserSortField::DateCreated => a.date_created.cmp(&b.date_created),
        }
    }
}

/// Sortable task fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    Id,
    Name,
    Deadline,
    Completed,
    AssignedUserName,
    DateCreated,
}

impl TaskSortField {
    /// Backing column name
    pub fn column(self) -> &'static str {
        match self {
            TaskSortField::Id => "id",
            TaskSortField::Name => "name",
            TaskSortField::Deadline => "deadline",
            TaskSortField::Completed => "completed",
            TaskSortField::AssignedUserName => "assigned_user_name",
            TaskSortField::DateCreated => "date_created",
        }
    }

    /// Compares two tasks on this field
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            TaskSortField::Id => a.id.cmp(&b.id),
            TaskSortField::Name => a.name.cmp(&b.name),
            TaskSortField::Deadline => a.deadline.cmp(&b.deadline),
            TaskSortField::Completed => a.completed.cmp(&b.completed),
            TaskSortField::AssignedUserName => a.assigned_user_name.cmp(&b.assigned_user_name),
            TaskSortField::DateCreated => a.date_created.cmp(&b.date_created),
        }
    }
}

/// User filter. All set conditions must hold; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Id must be one of these
    pub ids: Option<Vec<Uuid>>,

    /// Exact name
    pub name: Option<String>,

    /// Exact email
    pub email: Option<String>,

    /// Pending list must contain this task id
    pub pending_task: Option<Uuid>,
}

impl UserFilter {
    /// Matches a single user by id
    pub fn by_id(id: Uuid) -> Self {
        Self {
            ids: Some(vec![id]),
            ..Default::default()
        }
    }

    /// Matches users whose pending list contains `task_id`
    pub fn with_pending_task(task_id: Uuid) -> Self {
        Self {
            pending_task: Some(task_id),
            ..Default::default()
        }
    }

    /// Evaluates the filter against one user
    pub fn matches(&self, user: &User) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&user.id))
            && self.name.as_ref().map_or(true, |name| *name == user.name)
            && self.email.as_ref().map_or(true, |email| *email == user.email)
            && self
                .pending_task
                .map_or(true, |task_id| user.has_pending(task_id))
    }
}

/// Task filter. All set conditions must hold; an empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Id must be one of these
    pub ids: Option<Vec<Uuid>>,

    /// Exact name
    pub name: Option<String>,

    /// Completed flag
    pub completed: Option<bool>,

    /// Assignee; `Some(None)` selects unassigned tasks
    pub assigned_user: Option<Option<Uuid>>,

    /// Exact cached assignee name
    pub assigned_user_name: Option<String>,
}

impl TaskFilter {
    /// Matches tasks whose id is in `ids`
    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Default::default()
        }
    }

    /// Matches tasks assigned to `user_id`
    pub fn assigned_to(user_id: Uuid) -> Self {
        Self {
            assigned_user: Some(Some(user_id)),
            ..Default::default()
        }
    }

    /// Evaluates the filter against one task
    pub fn matches(&self, task: &Task) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(&task.id))
            && self.name.as_ref().map_or(true, |name| *name == task.name)
            && self.completed.map_or(true, |completed| completed == task.completed)
            && self
                .assigned_user
                .map_or(true, |assignee| assignee == task.assigned_user)
            && self
                .assigned_user_name
                .as_ref()
                .map_or(true, |name| *name == task.assigned_user_name)
    }
}

/// Element patch on a user's pending list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingTasksPatch {
    /// Append the id if absent (set-add)
    Add(Uuid),

    /// Remove every occurrence of the id (set-remove)
    Pull(Uuid),
}

impl PendingTasksPatch {
    /// Applies the patch; returns true if the user changed
    pub fn apply(&self, user: &mut User) -> bool {
        match *self {
            PendingTasksPatch::Add(task_id) => user.add_pending(task_id),
            PendingTasksPatch::Pull(task_id) => user.pull_pending(task_id),
        }
    }
}

/// Field-set patch on tasks. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New assignee; `Some(None)` clears it
    pub assigned_user: Option<Option<Uuid>>,

    /// New cached assignee name
    pub assigned_user_name: Option<String>,
}

impl TaskPatch {
    /// Applies the patch; returns true if the task changed
    pub fn apply(&self, task: &mut Task) -> bool {
        let before = task.clone();
        if let Some(assignee) = self.assigned_user {
            task.assigned_user = assignee;
        }
        if let Some(name) = &self.assigned_user_name {
            task.assigned_user_name = name.clone();
        }
        *task != before
    }

    /// Whether the patch sets nothing
    pub fn is_empty(&self) -> bool {
        self.assigned_user.is_none() && self.assigned_user_name.is_none()
    }
}

/// CRUD collaborator over the `users` and `tasks` collections
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs and health output (e.g. "postgres")
    fn backend(&self) -> &'static str;

    /// Cheap connectivity probe
    async fn ping(&self) -> StoreResult<()>;

    /// Releases backend resources. Called once at shutdown.
    async fn close(&self) {}

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_users(
        &self,
        filter: &UserFilter,
        options: &FindOptions<UserSortField>,
    ) -> StoreResult<Vec<User>>;

    async fn count_users(&self, filter: &UserFilter) -> StoreResult<u64>;

    /// Upserts a whole user by id, enforcing email uniqueness
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    /// Applies `patch` to every matching user; returns the number modified
    async fn update_users(&self, filter: &UserFilter, patch: PendingTasksPatch) -> StoreResult<u64>;

    /// Returns true if a user was deleted
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        options: &FindOptions<TaskSortField>,
    ) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64>;

    /// Upserts a whole task by id
    async fn save_task(&self, task: &Task) -> StoreResult<()>;

    /// Applies `patch` to every matching task; returns the number modified
    async fn update_tasks(&self, filter: &TaskFilter, patch: &TaskPatch) -> StoreResult<u64>;

    /// Returns true if a task was deleted
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_find_options_sort_skip_limit() {
        let options = FindOptions {
            sort: vec![SortKey {
                field: UserSortField::Name,
                direction: SortDirection::Desc,
            }],
            skip: Some(1),
            limit: Some(1),
        };

        let users = vec![
            User::new("alice", "a@x.com", Vec::new()),
            User::new("carol", "c@x.com", Vec::new()),
            User::new("bob", "b@x.com", Vec::new()),
        ];

        let result = options.apply(users, UserSortField::compare);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "bob");
    }

    #[test]
    fn test_task_filter_unassigned() {
        let user = User::new("Alice", "a@x.com", Vec::new());
        let mut assigned = Task::new("a", Utc::now());
        assigned.assign_to(&user);
        let unassigned = Task::new("b", Utc::now() + Duration::days(1));

        let filter = TaskFilter {
            assigned_user: Some(None),
            ..Default::default()
        };

        assert!(!filter.matches(&assigned));
        assert!(filter.matches(&unassigned));
        assert!(TaskFilter::assigned_to(user.id).matches(&assigned));
    }

    #[test]
    fn test_task_patch_reports_change() {
        let mut task = Task::new("a", Utc::now());
        let patch = TaskPatch {
            assigned_user: Some(None),
            assigned_user_name: Some("unassigned".to_string()),
        };
        assert!(!patch.apply(&mut task));

        let user = crate::models::User::new("Alice", "a@x.com", Vec::new());
        let patch = TaskPatch {
            assigned_user: Some(Some(user.id)),
            assigned_user_name: Some(user.name.clone()),
        };
        assert!(patch.apply(&mut task));
        assert_eq!(task.assigned_user, Some(user.id));
        assert!(!patch.apply(&mut task));
    }
}
