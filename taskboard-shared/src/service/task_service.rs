/// Task endpoint sequences
///
/// A task write resolves the requested assignee first (so the cached name is
/// right on the first save), saves the task, then hands the before/after
/// assignment to the reconciler.

use crate::error::{DomainError, DomainResult};
use crate::models::{Task, TaskInput, User};
use crate::reconcile::AssignmentReconciler;
use crate::store::{FindOptions, Store, TaskFilter, TaskSortField};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Operations on the tasks collection
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn Store>,
    reconciler: AssignmentReconciler,
}

impl TaskService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let reconciler = AssignmentReconciler::new(store.clone());
        Self { store, reconciler }
    }

    /// Creates a task, optionally pre-assigned
    ///
    /// # Errors
    ///
    /// `InvalidArgument("Assigned user not found")` if the assignee does not exist
    pub async fn create(&self, input: TaskInput) -> DomainResult<Task> {
        let assignee = self.resolve_assignee(input.assigned_user).await?;

        let mut task = Task::new(input.name, input.deadline);
        task.description = input.description;
        task.completed = input.completed;
        apply_assignee(&mut task, assignee.as_ref());

        self.store.save_task(&task).await?;
        self.reconciler.reconcile_on_task_write(&task, None, false).await?;

        info!(task_id = %task.id, assigned_user = ?task.assigned_user, "Task created");
        Ok(task)
    }

    /// Replaces every field of a task
    ///
    /// # Errors
    ///
    /// - `NotFound` if the task does not exist
    /// - `InvalidArgument("Assigned user not found")` if the assignee does not exist
    pub async fn update(&self, id: Uuid, input: TaskInput) -> DomainResult<Task> {
        let mut task = self.get(id).await?;
        let assignee = self.resolve_assignee(input.assigned_user).await?;

        let previous_assignee = task.assigned_user;
        let previous_completed = task.completed;

        task.name = input.name;
        task.description = input.description;
        task.deadline = input.deadline;
        task.completed = input.completed;
        apply_assignee(&mut task, assignee.as_ref());

        self.store.save_task(&task).await?;
        self.reconciler
            .reconcile_on_task_write(&task, previous_assignee, previous_completed)
            .await?;

        info!(
            task_id = %task.id,
            assigned_user = ?task.assigned_user,
            completed = task.completed,
            "Task updated"
        );
        Ok(task)
    }

    /// Deletes a task and removes it from its assignee's pending list
    ///
    /// # Errors
    ///
    /// `NotFound` if the task does not exist
    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let task = self.get(id).await?;

        self.store.delete_task(task.id).await?;
        self.reconciler.detach_deleted_task(&task).await?;

        info!(task_id = %task.id, "Task deleted");
        Ok(())
    }

    /// Loads one task
    ///
    /// # Errors
    ///
    /// `NotFound` if the task does not exist
    pub async fn get(&self, id: Uuid) -> DomainResult<Task> {
        self.store
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Task not found"))
    }

    pub async fn list(
        &self,
        filter: &TaskFilter,
        options: &FindOptions<TaskSortField>,
    ) -> DomainResult<Vec<Task>> {
        Ok(self.store.find_tasks(filter, options).await?)
    }

    pub async fn count(&self, filter: &TaskFilter) -> DomainResult<u64> {
        Ok(self.store.count_tasks(filter).await?)
    }

    async fn resolve_assignee(&self, assignee: Option<Uuid>) -> DomainResult<Option<User>> {
        match assignee {
            None => Ok(None),
            Some(id) => self
                .store
                .find_user_by_id(id)
                .await?
                .map(Some)
                .ok_or_else(|| DomainError::invalid("Assigned user not found")),
        }
    }
}

fn apply_assignee(task: &mut Task, assignee: Option<&User>) {
    match assignee {
        Some(user) => task.assign_to(user),
        None => task.unassign(),
    }
}
