/// In-memory document store
///
/// Keeps both collections in insertion order behind `tokio::sync::RwLock`s,
/// so an unsorted find returns documents in natural order just like a
/// document database would. Email uniqueness is enforced on save.
///
/// Used when no `DATABASE_URL` is configured and throughout the test suites.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::User;
/// use taskboard_shared::store::{MemoryStore, Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let user = User::new("Alice", "a@x.com", Vec::new());
/// store.save_user(&user).await?;
/// assert!(store.find_user_by_id(user.id).await?.is_some());
/// # Ok(())
/// # }
/// ```

use super::{
    FindOptions, PendingTasksPatch, Store, StoreError, StoreResult, TaskFilter, TaskPatch,
    TaskSortField, UserFilter, UserSortField,
};
use crate::models::{Task, User};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store backed by two vectors
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

/// Replaces the document with the same id or appends a new one
fn upsert<T>(docs: &mut Vec<T>, doc: &T, same_id: impl Fn(&T) -> bool)
where
    T: Clone,
{
    match docs.iter_mut().find(|existing| same_id(existing)) {
        Some(existing) => *existing = doc.clone(),
        None => docs.push(doc.clone()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_users(
        &self,
        filter: &UserFilter,
        options: &FindOptions<UserSortField>,
    ) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        let matching = users.iter().filter(|user| filter.matches(user)).cloned().collect();
        Ok(options.apply(matching, UserSortField::compare))
    }

    async fn count_users(&self, filter: &UserFilter) -> StoreResult<u64> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|user| filter.matches(user)).count() as u64)
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;

        if users
            .iter()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(StoreError::Duplicate {
                field: "email".to_string(),
            });
        }

        upsert(&mut users, user, |existing| existing.id == user.id);
        Ok(())
    }

    async fn update_users(&self, filter: &UserFilter, patch: PendingTasksPatch) -> StoreResult<u64> {
        let mut users = self.users.write().await;
        let modified = users
            .iter_mut()
            .filter(|user| filter.matches(user))
            .map(|user| patch.apply(user))
            .filter(|changed| *changed)
            .count();
        Ok(modified as u64)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() != before)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        options: &FindOptions<TaskSortField>,
    ) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        let matching = tasks.iter().filter(|task| filter.matches(task)).cloned().collect();
        Ok(options.apply(matching, TaskSortField::compare))
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|task| filter.matches(task)).count() as u64)
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let mut tasks = self.tasks.write().await;
        upsert(&mut tasks, task, |existing| existing.id == task.id);
        Ok(())
    }

    async fn update_tasks(&self, filter: &TaskFilter, patch: &TaskPatch) -> StoreResult<u64> {
        let mut tasks = self.tasks.write().await;
        let modified = tasks
            .iter_mut()
            .filter(|task| filter.matches(task))
            .map(|task| patch.apply(task))
            .filter(|changed| *changed)
            .count();
        Ok(modified as u64)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        Ok(tasks.len() != before)
    }
}
