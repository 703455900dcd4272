//! # Taskboard API Server Library
//!
//! HTTP surface of the Taskboard service: users, tasks, and the assignment
//! bookkeeping between them, served under `/api`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
