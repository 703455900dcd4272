/// User endpoint sequences
///
/// Create and update share one shape: check that every requested pending
/// task exists, save the user with the new list, reconcile the tasks, then
/// copy the (possibly renamed) user's name onto all of their tasks.

use crate::error::{DomainError, DomainResult};
use crate::models::{User, UserInput};
use crate::reconcile::AssignmentReconciler;
use crate::store::{FindOptions, Store, UserFilter, UserSortField};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Operations on the users collection
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
    reconciler: AssignmentReconciler,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let reconciler = AssignmentReconciler::new(store.clone());
        Self { store, reconciler }
    }

    /// Creates a user and assigns them every task in `input.pending_tasks`
    ///
    /// # Errors
    ///
    /// - `ReferenceError` if a pending task does not exist
    /// - `Conflict` if the email is taken
    pub async fn create(&self, input: UserInput) -> DomainResult<User> {
        let tasks = self.reconciler.ensure_tasks_exist(&input.pending_tasks).await?;

        let user = User::new(input.name, input.email, input.pending_tasks);
        self.store.save_user(&user).await?;

        self.reconciler
            .reconcile_on_user_write(&user, &user.pending_tasks, &[], &tasks)
            .await?;
        self.reconciler.propagate_user_name(&user).await?;

        info!(user_id = %user.id, pending = user.pending_tasks.len(), "User created");
        Ok(user)
    }

    /// Replaces a user's name, email and pending list
    ///
    /// Tasks dropped from the list are unassigned; tasks in the list are
    /// (re)assigned to this user and reopened.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the user does not exist
    /// - `ReferenceError` if a pending task does not exist
    /// - `Conflict` if the email is taken by someone else
    pub async fn update(&self, id: Uuid, input: UserInput) -> DomainResult<User> {
        let mut user = self.get(id).await?;

        let tasks = self.reconciler.ensure_tasks_exist(&input.pending_tasks).await?;
        let previous_pending = std::mem::take(&mut user.pending_tasks);

        user.name = input.name;
        user.email = input.email;
        user.pending_tasks = input.pending_tasks;
        self.store.save_user(&user).await?;

        self.reconciler
            .reconcile_on_user_write(&user, &user.pending_tasks, &previous_pending, &tasks)
            .await?;
        self.reconciler.propagate_user_name(&user).await?;

        info!(user_id = %user.id, pending = user.pending_tasks.len(), "User updated");
        Ok(user)
    }

    /// Deletes a user after unassigning all of their tasks
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist
    pub async fn delete(&self, id: Uuid) -> DomainResult<()> {
        let user = self.get(id).await?;

        let released = self.reconciler.unassign_all(user.id).await?;
        self.store.delete_user(user.id).await?;

        info!(user_id = %user.id, released, "User deleted");
        Ok(())
    }

    /// Loads one user
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist
    pub async fn get(&self, id: Uuid) -> DomainResult<User> {
        self.store
            .find_user_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User not found"))
    }

    pub async fn list(
        &self,
        filter: &UserFilter,
        options: &FindOptions<UserSortField>,
    ) -> DomainResult<Vec<User>> {
        Ok(self.store.find_users(filter, options).await?)
    }

    pub async fn count(&self, filter: &UserFilter) -> DomainResult<u64> {
        Ok(self.store.count_users(filter).await?)
    }
}
