/// User and task services
///
/// Each method is the full read/write sequence behind one endpoint: load,
/// validate references, save the entity, then let the
/// [`AssignmentReconciler`](crate::reconcile::AssignmentReconciler) patch the
/// other side of the relationship.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::models::UserInput;
/// use taskboard_shared::service::UserService;
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let users = UserService::new(Arc::new(MemoryStore::new()));
/// let alice = users
///     .create(UserInput {
///         name: "Alice".to_string(),
///         email: "a@x.com".to_string(),
///         pending_tasks: Vec::new(),
///     })
///     .await?;
/// assert!(alice.pending_tasks.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod task_service;
pub mod user_service;

pub use task_service::TaskService;
pub use user_service::UserService;
