/// Input normalization
///
/// Request bodies are loosely typed: a pending-task list may arrive as a
/// JSON array, a single id, a string holding a JSON array, or any nesting of
/// those; flags and deadlines may be strings or numbers. Everything here
/// turns such a `serde_json::Value` into the typed value the services want,
/// or a [`DomainError::InvalidArgument`] naming the offending input.

use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

/// Strings that mean "no assignee" (compared case-insensitively)
const UNASSIGNED_SENTINELS: [&str; 3] = ["unassigned", "null", "undefined"];

/// Normalizes a task id list
///
/// Flattens nested arrays and JSON-encoded arrays, drops empty entries and
/// duplicates (first occurrence wins), and rejects malformed ids.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use taskboard_shared::validation::sanitize_id_list;
///
/// let id = "6f1c1d5e-8a8e-4b83-9e0c-3f1b0f7c2a11";
/// let ids = sanitize_id_list(&json!([id, [id], format!("[\"{id}\"]")])).unwrap();
/// assert_eq!(ids.len(), 1);
/// ```
pub fn sanitize_id_list(value: &Value) -> DomainResult<Vec<Uuid>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                collect_ids(item, &mut seen, &mut ids)?;
            }
        }
        other => collect_ids(other, &mut seen, &mut ids)?,
    }

    Ok(ids)
}

fn collect_ids(value: &Value, seen: &mut HashSet<Uuid>, ids: &mut Vec<Uuid>) -> DomainResult<()> {
    let raw = match value {
        Value::Null => return Ok(()),
        Value::Array(items) => {
            for item in items {
                collect_ids(item, seen, ids)?;
            }
            return Ok(());
        }
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    if raw.is_empty() {
        return Ok(());
    }

    if raw.starts_with('[') {
        let nested: Value = serde_json::from_str(&raw)
            .map_err(|_| DomainError::invalid(format!("Invalid task id list: {}", raw)))?;
        return match nested {
            Value::Array(items) => {
                for item in &items {
                    collect_ids(item, seen, ids)?;
                }
                Ok(())
            }
            single => collect_ids(&single, seen, ids),
        };
    }

    let id = parse_id(&raw).ok_or_else(|| DomainError::invalid(format!("Invalid task id: {}", raw)))?;
    if seen.insert(id) {
        ids.push(id);
    }
    Ok(())
}

/// Parses a well-formed id
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Normalizes an `assignedUser` value
///
/// Absent, null, empty and the sentinels "unassigned" / "null" / "undefined"
/// (any case) all mean no assignee.
///
/// # Errors
///
/// `InvalidArgument("Invalid assignedUser id")` for anything else that is not
/// a well-formed id.
pub fn normalize_assignee(value: Option<&Value>) -> DomainResult<Option<Uuid>> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };

    let lowered = raw.to_lowercase();
    if raw.is_empty() || UNASSIGNED_SENTINELS.contains(&lowered.as_str()) {
        return Ok(None);
    }

    parse_id(&raw)
        .map(Some)
        .ok_or_else(|| DomainError::invalid("Invalid assignedUser id"))
}

/// Interprets a loosely typed boolean flag
///
/// `true`/`"true"`/`"1"`/`1` are true, `false`/`"false"`/`"0"`/`0` and
/// absent/null are false. Other values follow truthiness.
pub fn parse_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            other => !other.is_empty(),
        },
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Parses a deadline
///
/// Accepts RFC 3339 and RFC 2822 strings, `YYYY-MM-DD`, naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC), and epoch milliseconds as a
/// number or numeric string. Returns `None` for anything else.
pub fn parse_deadline(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::Number(n) => n.as_f64().and_then(from_epoch_millis),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Ok(millis) = trimmed.parse::<f64>() {
                return from_epoch_millis(millis);
            }
            parse_date_string(trimmed)
        }
        _ => None,
    }
}

fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis.trunc() as i64).single()
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Reads a required text field: trimmed, empty when absent or falsy
pub fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => String::new(),
        Some(other) => stringify(other).trim().to_string(),
    }
}

/// Reads an optional free-text field without trimming
pub fn optional_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => String::new(),
        Some(other) => stringify(other),
    }
}

/// Text form of a loose body value. Arrays join their items with commas,
/// so `[]` reads as empty and `["a"]` as `a`.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
