/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check and API root
/// - `users`: `/api/users` CRUD
/// - `tasks`: `/api/tasks` CRUD
/// - `query`: `where` / `sort` / `select` parsing shared by both
/// - `response`: Success envelope

pub mod health;
pub mod query;
pub mod response;
pub mod tasks;
pub mod users;

use crate::error::{ApiError, ApiResult};
use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{Map, Value};
use taskboard_shared::validation::parse_id;
use uuid::Uuid;

/// Parses a path id, or 400 with `message`
pub(crate) fn path_id(raw: &str, message: &str) -> ApiResult<Uuid> {
    parse_id(raw).ok_or_else(|| ApiError::BadRequest(message.to_string()))
}

/// Unwraps a JSON body into its fields; a non-object body has none
pub(crate) fn body_fields(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    let Json(value) = body?;
    Ok(match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    })
}
