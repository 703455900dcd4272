//! # Taskboard Shared Library
//!
//! Domain core for the Taskboard API: users, tasks, and the bookkeeping that
//! keeps a user's pending-task list and each task's assignee in agreement.
//!
//! ## Module Organization
//!
//! - `models`: User and task documents
//! - `store`: Document store collaborator trait, PostgreSQL and in-memory backends
//! - `db`: PostgreSQL pool and migrations
//! - `validation`: Normalization of loosely typed request values
//! - `reconcile`: The assignment reconciler
//! - `service`: Per-endpoint read/write sequences built on the reconciler
//! - `error`: Domain error taxonomy

pub mod db;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{DomainError, DomainResult};

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
