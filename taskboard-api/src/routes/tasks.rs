/// `/api/tasks` endpoints
///
/// ```text
/// GET    /api/tasks        list (where, sort, select, skip, limit=100, count)
/// POST   /api/tasks        create
/// GET    /api/tasks/:id    fetch (select)
/// PUT    /api/tasks/:id    replace every field
/// DELETE /api/tasks/:id    delete, removing it from the assignee's pending list
/// ```
///
/// Request body:
///
/// ```json
/// {
///   "name": "Write docs",
///   "description": "",
///   "deadline": "2030-01-01T00:00:00Z",
///   "completed": false,
///   "assignedUser": "<user id>"
/// }
/// ```
///
/// `assignedUserName` in a body is ignored; it is always derived from the
/// assignee.

use super::query::{parse_list, parse_projection, ListParams, Tasks};
use super::response::ApiResponse;
use super::{body_fields, path_id};
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use taskboard_shared::models::TaskInput;
use taskboard_shared::validation::{
    normalize_assignee, optional_text, parse_deadline, parse_flag, text_field,
};
use validator::Validate;

/// Tasks listed without an explicit `limit`
const DEFAULT_TASK_LIMIT: u64 = 100;

/// Required task fields after normalization
#[derive(Debug, Validate)]
pub struct TaskForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(required(message = "deadline is required"))]
    pub deadline: Option<DateTime<Utc>>,
}

impl TaskForm {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            name: text_field(fields.get("name")),
            deadline: parse_deadline(fields.get("deadline")),
        }
    }
}

/// Validates the body and normalizes the optional fields
fn task_input(fields: &Map<String, Value>, action: &str) -> ApiResult<TaskInput> {
    let form = TaskForm::from_fields(fields);
    form.validate().map_err(|errors| {
        ApiError::from_validation(
            format!("Both name and deadline are required to {} a task", action),
            errors,
        )
    })?;

    let deadline = form.deadline.ok_or_else(|| {
        ApiError::BadRequest(format!("Both name and deadline are required to {} a task", action))
    })?;

    Ok(TaskInput {
        name: form.name,
        description: optional_text(fields.get("description")),
        deadline,
        completed: parse_flag(fields.get("completed")),
        assigned_user: normalize_assignee(fields.get("assignedUser"))?,
    })
}

pub async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse> {
    let Query(params) = params?;
    let query = parse_list::<Tasks>(&params, Some(DEFAULT_TASK_LIMIT))?;

    if query.count {
        let total = state.tasks.count(&query.filter).await?;
        return Ok(ApiResponse::ok("OK", json!(total)));
    }

    let tasks = state.tasks.list(&query.filter, &query.options).await?;
    Ok(ApiResponse::ok("OK", query.projection.render_all(&tasks)?))
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let fields = body_fields(body)?;
    let input = task_input(&fields, "create")?;

    let task = state.tasks.create(input).await?;
    Ok(ApiResponse::created("Task created", json!(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid task id")?;
    let Query(params) = params?;
    let projection = parse_projection::<Tasks>(&params)?;

    let task = state.tasks.get(id).await?;
    Ok(ApiResponse::ok("OK", projection.render(&task)?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid task id")?;
    let fields = body_fields(body)?;

    // Unknown ids are reported before body errors
    state.tasks.get(id).await?;
    let input = task_input(&fields, "update")?;

    let task = state.tasks.update(id, input).await?;
    Ok(ApiResponse::ok("Task updated", json!(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid task id")?;

    state.tasks.delete(id).await?;
    Ok(ApiResponse::ok("Task deleted", Value::Null))
}
