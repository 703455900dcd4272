/// Assignment reconciler
///
/// `User::pending_tasks` and `Task::assigned_user` are two denormalized
/// mirrors of the same relationship, and the store enforces nothing between
/// them. After one side is written, the reconciler issues the writes that
/// bring the other side back in line:
///
/// - [`AssignmentReconciler::reconcile_on_user_write`] after a user's pending
///   list was replaced (unassign removed tasks, assign and reopen the rest,
///   stealing them from any previous owner)
/// - [`AssignmentReconciler::reconcile_on_task_write`] after a task's assignee
///   or completed flag changed (patch the affected pending lists)
/// - [`AssignmentReconciler::unassign_all`] before a user is deleted
/// - [`AssignmentReconciler::detach_deleted_task`] after a task is deleted
///
/// # Consistency
///
/// Writes are issued one at a time and never rolled back. If a step fails,
/// the steps before it stay applied and the mirrors may disagree until the
/// next write touching the same documents. Concurrent requests are not
/// serialized either: two requests reassigning the same task race, the last
/// task save wins, and a steal may pull the task from a pending list that a
/// concurrent request just added it to.

use crate::error::{DomainError, DomainResult};
use crate::models::{Task, User, UNASSIGNED};
use crate::store::{FindOptions, PendingTasksPatch, Store, TaskFilter, TaskPatch, UserFilter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Keeps pending lists and task assignees in agreement
#[derive(Clone)]
pub struct AssignmentReconciler {
    store: Arc<dyn Store>,
}

impl AssignmentReconciler {
    /// Creates a reconciler over `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fetches every task in `task_ids`
    ///
    /// Returns the matched tasks so the caller can hand them to
    /// [`Self::reconcile_on_user_write`] without a second read.
    ///
    /// # Errors
    ///
    /// `DomainError::ReferenceError` listing the ids with no matching task,
    /// in request order.
    pub async fn ensure_tasks_exist(&self, task_ids: &[Uuid]) -> DomainResult<Vec<Task>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = self
            .store
            .find_tasks(&TaskFilter::by_ids(task_ids.to_vec()), &FindOptions::default())
            .await?;

        let found: HashSet<Uuid> = tasks.iter().map(|task| task.id).collect();
        let missing: Vec<Uuid> = task_ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();

        if !missing.is_empty() {
            debug!(missing = missing.len(), "Referenced tasks not found");
            return Err(DomainError::ReferenceError { missing });
        }

        Ok(tasks)
    }

    /// Brings tasks in line with a user's freshly saved pending list
    ///
    /// Tasks in `previous_pending` but not in `new_pending` that still point
    /// at this user are unassigned. Every task in `new_pending` (not just the
    /// delta) is pulled from any other user's pending list, assigned to this
    /// user under their current name, and reopened.
    ///
    /// `new_pending` must already have passed [`Self::ensure_tasks_exist`].
    /// `preloaded` is whatever that call returned; if it does not cover the
    /// whole target set the tasks are fetched again.
    pub async fn reconcile_on_user_write(
        &self,
        user: &User,
        new_pending: &[Uuid],
        previous_pending: &[Uuid],
        preloaded: &[Task],
    ) -> DomainResult<()> {
        let target: HashSet<Uuid> = new_pending.iter().copied().collect();
        let removed: Vec<Uuid> = previous_pending
            .iter()
            .copied()
            .filter(|id| !target.contains(id))
            .collect();

        if !removed.is_empty() {
            let filter = TaskFilter {
                ids: Some(removed),
                assigned_user: Some(Some(user.id)),
                ..Default::default()
            };
            let released = self.store.find_tasks(&filter, &FindOptions::default()).await?;

            for mut task in released {
                task.unassign();
                self.store.save_task(&task).await?;
                debug!(task_id = %task.id, user_id = %user.id, "Unassigned task dropped from pending list");
            }
        }

        if new_pending.is_empty() {
            return Ok(());
        }

        let by_id: HashMap<Uuid, &Task> = preloaded.iter().map(|task| (task.id, task)).collect();
        let mut to_assign: Vec<Task> = new_pending
            .iter()
            .filter_map(|id| by_id.get(id).map(|task| (*task).clone()))
            .collect();

        if to_assign.len() != new_pending.len() {
            to_assign = self
                .store
                .find_tasks(&TaskFilter::by_ids(new_pending.to_vec()), &FindOptions::default())
                .await?;
        }

        for mut task in to_assign {
            if let Some(previous_owner) = task.assigned_user.filter(|owner| *owner != user.id) {
                self.store
                    .update_users(
                        &UserFilter::by_id(previous_owner),
                        PendingTasksPatch::Pull(task.id),
                    )
                    .await?;
                debug!(
                    task_id = %task.id,
                    from_user = %previous_owner,
                    to_user = %user.id,
                    "Stole task from previous assignee"
                );
            }

            task.assign_to(user);
            task.completed = false;
            self.store.save_task(&task).await?;
        }

        Ok(())
    }

    /// Brings pending lists in line with a freshly saved task
    ///
    /// `previous_assignee` / `previous_completed` describe the task before the
    /// write (`None` / `false` on create). Rules, in order:
    ///
    /// 1. A previous assignee that differs from the new one loses the task.
    /// 2. A new assignee gains the task if it is open, loses it if completed.
    /// 3. With no new assignee the task is swept from every pending list.
    /// 4. An unchanged assignee whose task toggled completion gets rule 2 again.
    pub async fn reconcile_on_task_write(
        &self,
        task: &Task,
        previous_assignee: Option<Uuid>,
        previous_completed: bool,
    ) -> DomainResult<()> {
        let new_assignee = task.assigned_user;

        if let Some(previous) = previous_assignee {
            if Some(previous) != new_assignee {
                self.pull_pending(previous, task.id).await?;
            }
        }

        match new_assignee {
            Some(assignee) => self.sync_pending(assignee, task).await?,
            None => {
                let swept = self
                    .store
                    .update_users(
                        &UserFilter::with_pending_task(task.id),
                        PendingTasksPatch::Pull(task.id),
                    )
                    .await?;
                if swept > 0 {
                    debug!(task_id = %task.id, swept, "Swept unassigned task from pending lists");
                }
            }
        }

        if let Some(previous) = previous_assignee {
            if Some(previous) == new_assignee && previous_completed != task.completed {
                self.sync_pending(previous, task).await?;
            }
        }

        Ok(())
    }

    /// Copies `user.name` onto every task assigned to them
    pub async fn propagate_user_name(&self, user: &User) -> DomainResult<u64> {
        let patch = TaskPatch {
            assigned_user_name: Some(user.name.clone()),
            ..Default::default()
        };
        let updated = self
            .store
            .update_tasks(&TaskFilter::assigned_to(user.id), &patch)
            .await?;
        Ok(updated)
    }

    /// Unassigns every task assigned to `user_id` in one pass
    pub async fn unassign_all(&self, user_id: Uuid) -> DomainResult<u64> {
        let patch = TaskPatch {
            assigned_user: Some(None),
            assigned_user_name: Some(UNASSIGNED.to_string()),
        };
        let updated = self
            .store
            .update_tasks(&TaskFilter::assigned_to(user_id), &patch)
            .await?;
        debug!(user_id = %user_id, updated, "Unassigned tasks of deleted user");
        Ok(updated)
    }

    /// Removes a deleted task from its assignee's pending list
    pub async fn detach_deleted_task(&self, task: &Task) -> DomainResult<()> {
        if let Some(assignee) = task.assigned_user {
            self.pull_pending(assignee, task.id).await?;
        }
        Ok(())
    }

    /// Adds or removes `task` on `user_id`'s pending list by its completed flag
    async fn sync_pending(&self, user_id: Uuid, task: &Task) -> DomainResult<()> {
        if task.completed {
            self.pull_pending(user_id, task.id).await
        } else {
            self.store
                .update_users(&UserFilter::by_id(user_id), PendingTasksPatch::Add(task.id))
                .await?;
            Ok(())
        }
    }

    async fn pull_pending(&self, user_id: Uuid, task_id: Uuid) -> DomainResult<()> {
        self.store
            .update_users(&UserFilter::by_id(user_id), PendingTasksPatch::Pull(task_id))
            .await?;
        Ok(())
    }
}
