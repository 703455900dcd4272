/// List query parameters
///
/// `where`, `sort` and `select` (alias `filter`) arrive as JSON strings in the
/// query string. They are parsed into the store's typed filters over a fixed
/// field list per collection; any other field is rejected with 400 rather
/// than passed through to the store.
///
/// ```text
/// GET /api/tasks?where={"completed":false}&sort={"deadline":1}&select={"name":1}&limit=10
/// ```

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use taskboard_shared::store::{
    FindOptions, SortDirection, SortKey, TaskFilter, TaskSortField, UserFilter, UserSortField,
};
use taskboard_shared::validation::{normalize_assignee, parse_flag, parse_id};
use uuid::Uuid;

/// Raw query string of a list or get-by-id request
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    pub sort: Option<String>,
    pub select: Option<String>,
    pub filter: Option<String>,
    pub skip: Option<String>,
    pub limit: Option<String>,
    pub count: Option<String>,
}

/// Field vocabulary of one collection
pub trait Vocabulary {
    type Filter: Default + std::fmt::Debug;
    type SortField: Copy + std::fmt::Debug;

    /// Wire names that may appear in `select`
    const FIELDS: &'static [&'static str];

    /// Adds one `where` condition to `filter`
    fn where_condition(filter: &mut Self::Filter, field: &str, value: &Value) -> ApiResult<()>;

    /// Maps a wire name to a sortable field
    fn sort_field(field: &str) -> Option<Self::SortField>;
}

/// Vocabulary of `/api/users`
#[derive(Debug)]
pub struct Users;

/// Vocabulary of `/api/tasks`
#[derive(Debug)]
pub struct Tasks;

impl Vocabulary for Users {
    type Filter = UserFilter;
    type SortField = UserSortField;

    const FIELDS: &'static [&'static str] = &["_id", "name", "email", "pendingTasks", "dateCreated"];

    fn where_condition(filter: &mut UserFilter, field: &str, value: &Value) -> ApiResult<()> {
        match field {
            "_id" => filter.ids = Some(id_condition(field, value)?),
            "name" => filter.name = Some(string_condition(field, value)?),
            "email" => filter.email = Some(string_condition(field, value)?),
            "pendingTasks" => filter.pending_task = Some(single_id(field, value)?),
            other => return Err(unsupported_field(other, "where")),
        }
        Ok(())
    }

    fn sort_field(field: &str) -> Option<UserSortField> {
        match field {
            "_id" => Some(UserSortField::Id),
            "name" => Some(UserSortField::Name),
            "email" => Some(UserSortField::Email),
            "dateCreated" => Some(UserSortField::DateCreated),
            _ => None,
        }
    }
}

impl Vocabulary for Tasks {
    type Filter = TaskFilter;
    type SortField = TaskSortField;

    const FIELDS: &'static [&'static str] = &[
        "_id",
        "name",
        "description",
        "deadline",
        "completed",
        "assignedUser",
        "assignedUserName",
        "dateCreated",
    ];

    fn where_condition(filter: &mut TaskFilter, field: &str, value: &Value) -> ApiResult<()> {
        match field {
            "_id" => filter.ids = Some(id_condition(field, value)?),
            "name" => filter.name = Some(string_condition(field, value)?),
            "completed" => filter.completed = Some(bool_condition(field, value)?),
            "assignedUser" => filter.assigned_user = Some(normalize_assignee(Some(value))?),
            "assignedUserName" => {
                filter.assigned_user_name = Some(string_condition(field, value)?)
            }
            other => return Err(unsupported_field(other, "where")),
        }
        Ok(())
    }

    fn sort_field(field: &str) -> Option<TaskSortField> {
        match field {
            "_id" => Some(TaskSortField::Id),
            "name" => Some(TaskSortField::Name),
            "deadline" => Some(TaskSortField::Deadline),
            "completed" => Some(TaskSortField::Completed),
            "assignedUserName" => Some(TaskSortField::AssignedUserName),
            "dateCreated" => Some(TaskSortField::DateCreated),
            _ => None,
        }
    }
}

/// Field projection applied to serialized documents
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    All,
    /// Keep only these fields, plus `_id` when `with_id`
    Include { fields: Vec<String>, with_id: bool },
    /// Drop these fields
    Exclude(Vec<String>),
}

impl Projection {
    /// Projects one serialized document; non-objects pass through
    pub fn apply(&self, value: Value) -> Value {
        let mut doc = match value {
            Value::Object(doc) => doc,
            other => return other,
        };

        match self {
            Projection::All => {}
            Projection::Include { fields, with_id } => {
                doc.retain(|key, _| (*with_id && key == "_id") || fields.iter().any(|f| f == key));
            }
            Projection::Exclude(fields) => {
                doc.retain(|key, _| !fields.iter().any(|f| f == key));
            }
        }

        Value::Object(doc)
    }

    /// Serializes and projects one document
    pub fn render<T: Serialize>(&self, doc: &T) -> ApiResult<Value> {
        let value = serde_json::to_value(doc)
            .map_err(|e| ApiError::InternalError(format!("Serialization failed: {}", e)))?;
        Ok(self.apply(value))
    }

    /// Serializes and projects a list of documents
    pub fn render_all<T: Serialize>(&self, docs: &[T]) -> ApiResult<Value> {
        docs.iter()
            .map(|doc| self.render(doc))
            .collect::<ApiResult<Vec<Value>>>()
            .map(Value::Array)
    }
}

/// Parsed list request
#[derive(Debug)]
pub struct ListQuery<V: Vocabulary> {
    pub filter: V::Filter,
    pub options: FindOptions<V::SortField>,
    pub projection: Projection,
    pub count: bool,
}

/// Parses a list request
///
/// `default_limit` applies when no `limit` is given and `count` is off.
pub fn parse_list<V: Vocabulary>(
    params: &ListParams,
    default_limit: Option<u64>,
) -> ApiResult<ListQuery<V>> {
    let mut filter = V::Filter::default();
    if let Some(conditions) = json_object(params.where_clause.as_deref(), "where")? {
        for (field, value) in &conditions {
            V::where_condition(&mut filter, field, value)?;
        }
    }

    let mut sort = Vec::new();
    if let Some(keys) = json_object(params.sort.as_deref(), "sort")? {
        for (field, value) in &keys {
            let field_key = V::sort_field(field).ok_or_else(|| unsupported_field(field, "sort"))?;
            sort.push(SortKey {
                field: field_key,
                direction: sort_direction(field, value)?,
            });
        }
    }

    let count = params
        .count
        .as_ref()
        .map(|raw| parse_flag(Some(&Value::String(raw.clone()))))
        .unwrap_or(false);

    let skip = non_negative(params.skip.as_deref(), "skip")?;
    let limit = non_negative(params.limit.as_deref(), "limit")?;
    let limit = if count { None } else { limit.or(default_limit) };

    Ok(ListQuery {
        filter,
        options: FindOptions { sort, skip, limit },
        projection: parse_projection::<V>(params)?,
        count,
    })
}

/// Parses `select`, falling back to its `filter` alias
pub fn parse_projection<V: Vocabulary>(params: &ListParams) -> ApiResult<Projection> {
    let (raw, name) = match (&params.select, &params.filter) {
        (Some(select), _) => (Some(select.as_str()), "select"),
        (None, Some(filter)) => (Some(filter.as_str()), "filter"),
        (None, None) => (None, "select"),
    };

    let Some(fields) = json_object(raw, name)? else {
        return Ok(Projection::All);
    };

    let mut with_id = true;
    let mut included = Vec::new();
    let mut excluded = Vec::new();

    for (field, value) in &fields {
        if !V::FIELDS.contains(&field.as_str()) {
            return Err(unsupported_field(field, name));
        }

        let keep = match value {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(false, |n| n != 0.0),
            _ => {
                return Err(ApiError::BadRequest(format!(
                    "Invalid value for \"{}\" in \"{}\" parameter",
                    field, name
                )))
            }
        };

        if field == "_id" {
            with_id = keep;
        } else if keep {
            included.push(field.clone());
        } else {
            excluded.push(field.clone());
        }
    }

    if !included.is_empty() && !excluded.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Cannot mix inclusion and exclusion in \"{}\" parameter",
            name
        )));
    }

    if !included.is_empty() {
        return Ok(Projection::Include {
            fields: included,
            with_id,
        });
    }

    if !with_id {
        excluded.push("_id".to_string());
    }
    if excluded.is_empty() && fields.contains_key("_id") {
        // {"_id": 1} alone selects just the id
        return Ok(Projection::Include {
            fields: Vec::new(),
            with_id: true,
        });
    }
    if excluded.is_empty() {
        return Ok(Projection::All);
    }
    Ok(Projection::Exclude(excluded))
}

/// Parses a JSON object parameter; empty or absent is `None`
fn json_object(raw: Option<&str>, name: &str) -> ApiResult<Option<Map<String, Value>>> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let invalid = || ApiError::BadRequest(format!("Invalid JSON for \"{}\" parameter", name));
    match serde_json::from_str::<Value>(raw).map_err(|_| invalid())? {
        Value::Object(map) => Ok(Some(map)),
        _ => Err(invalid()),
    }
}

fn non_negative(raw: Option<&str>, name: &str) -> ApiResult<Option<u64>> {
    match raw.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => raw.parse::<u64>().map(Some).map_err(|_| {
            ApiError::BadRequest(format!("\"{}\" must be a non-negative integer", name))
        }),
    }
}

fn sort_direction(field: &str, value: &Value) -> ApiResult<SortDirection> {
    let direction = match value {
        Value::Number(n) if n.as_i64() == Some(1) => Some(SortDirection::Asc),
        Value::Number(n) if n.as_i64() == Some(-1) => Some(SortDirection::Desc),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortDirection::Asc),
            "desc" | "descending" | "-1" => Some(SortDirection::Desc),
            _ => None,
        },
        _ => None,
    };

    direction.ok_or_else(|| {
        ApiError::BadRequest(format!("Invalid sort direction for \"{}\"", field))
    })
}

fn unsupported_field(field: &str, param: &str) -> ApiError {
    ApiError::BadRequest(format!("Unsupported field \"{}\" in \"{}\" parameter", field, param))
}

fn invalid_condition(field: &str) -> ApiError {
    ApiError::BadRequest(format!("Invalid value for \"{}\" in \"where\" parameter", field))
}

fn string_condition(field: &str, value: &Value) -> ApiResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid_condition(field))
}

fn bool_condition(field: &str, value: &Value) -> ApiResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(invalid_condition(field)),
    }
}

fn single_id(field: &str, value: &Value) -> ApiResult<Uuid> {
    value
        .as_str()
        .and_then(parse_id)
        .ok_or_else(|| invalid_condition(field))
}

/// An id, or `{"$in": [ids]}`
fn id_condition(field: &str, value: &Value) -> ApiResult<Vec<Uuid>> {
    match value {
        Value::String(_) => Ok(vec![single_id(field, value)?]),
        Value::Object(operator) if operator.len() == 1 => match operator.get("$in") {
            Some(Value::Array(items)) => items.iter().map(|item| single_id(field, item)).collect(),
            _ => Err(invalid_condition(field)),
        },
        _ => Err(invalid_condition(field)),
    }
}
