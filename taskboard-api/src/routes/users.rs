/// `/api/users` endpoints
///
/// ```text
/// GET    /api/users        list (where, sort, select, skip, limit, count)
/// POST   /api/users        create
/// GET    /api/users/:id    fetch (select)
/// PUT    /api/users/:id    replace name, email and pendingTasks
/// DELETE /api/users/:id    delete, unassigning the user's tasks
/// ```
///
/// Request body:
///
/// ```json
/// { "name": "Alice", "email": "a@x.com", "pendingTasks": ["<task id>"] }
/// ```

use super::query::{parse_list, parse_projection, ListParams, Users};
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
use serde_json::{json, Map, Value};
use taskboard_shared::models::UserInput;
use taskboard_shared::validation::{sanitize_id_list, text_field};
use validator::Validate;

/// Required user fields after trimming
#[derive(Debug, Validate)]
pub struct UserForm {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

impl UserForm {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            name: text_field(fields.get("name")),
            email: text_field(fields.get("email")),
        }
    }
}

/// Validates the body and normalizes `pendingTasks`
fn user_input(fields: &Map<String, Value>, action: &str) -> ApiResult<UserInput> {
    let form = UserForm::from_fields(fields);
    form.validate().map_err(|errors| {
        ApiError::from_validation(
            format!("Both name and email are required to {} a user", action),
            errors,
        )
    })?;

    let pending_tasks = sanitize_id_list(fields.get("pendingTasks").unwrap_or(&Value::Null))?;

    Ok(UserInput {
        name: form.name,
        email: form.email,
        pending_tasks,
    })
}

pub async fn list_users(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse> {
    let Query(params) = params?;
    let query = parse_list::<Users>(&params, None)?;

    if query.count {
        let total = state.users.count(&query.filter).await?;
        return Ok(ApiResponse::ok("OK", json!(total)));
    }

    let users = state.users.list(&query.filter, &query.options).await?;
    Ok(ApiResponse::ok("OK", query.projection.render_all(&users)?))
}

pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let fields = body_fields(body)?;
    let input = user_input(&fields, "create")?;

    let user = state.users.create(input).await?;
    Ok(ApiResponse::created("User created", json!(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid user id")?;
    let Query(params) = params?;
    let projection = parse_projection::<Users>(&params)?;

    let user = state.users.get(id).await?;
    Ok(ApiResponse::ok("OK", projection.render(&user)?))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid user id")?;
    let fields = body_fields(body)?;
    let input = user_input(&fields, "update")?;

    let user = state.users.update(id, input).await?;
    Ok(ApiResponse::ok("User updated", json!(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse> {
    let id = path_id(&id, "Invalid user id")?;

    state.users.delete(id).await?;
    Ok(ApiResponse::ok("User deleted", Value::Null))
}
