/// Document models for Taskboard
///
/// # Models
///
/// - `user`: Users and their pending-task lists
/// - `task`: Tasks and their (single) assignee
///
/// The two are mirrors of one relationship. Persisting a model never touches
/// the other side; that is the reconciler's job.

pub mod task;
pub mod user;

pub use task::{Task, TaskInput, UNASSIGNED};
pub use user::{User, UserInput};
