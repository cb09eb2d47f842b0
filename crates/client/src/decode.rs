//! Tolerant-decode boundary for loosely-shaped backend payloads.
//!
//! The backend names fields inconsistently across deployments (the
//! upload id alone has five spellings in the wild) and nests optional
//! detail arrays that may be missing, null, or partially malformed.
//! Every such ambiguity is resolved here, once, so the rest of the
//! client only ever sees the typed `drawbridge-core` payload model.

use serde_json::Value;

use drawbridge_core::payload::{
    AxisSummary, Border, EntityTable, LayerInfo, ParsedGeometry, SemanticSummary,
};
use drawbridge_core::status::StatusReport;

use crate::api::ApiError;

/// Accepted spellings of the upload response's identifier field.
const REMOTE_ID_ALIASES: [&str; 5] = ["file_id", "fileId", "id", "uuid", "upload_id"];

/// Accepted spellings of the status payload's state field.
const STATE_ALIASES: [&str; 3] = ["status", "state", "phase"];

/// Accepted spellings of the status payload's message field.
const MESSAGE_ALIASES: [&str; 3] = ["message", "detail", "error"];

/// Accepted spellings of the status payload's progress field.
const PROGRESS_ALIASES: [&str; 2] = ["progress", "percent"];

/// Accepted spellings of the conversion artifact path.
const ARTIFACT_ALIASES: [&str; 5] = [
    "artifact_path",
    "dxf_path",
    "output_path",
    "path_dxf",
    "result_path",
];

fn first_present<'a>(value: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| {
        let v = value.get(key)?;
        (!v.is_null()).then_some(v)
    })
}

fn first_string(value: &Value, aliases: &[&str]) -> Option<String> {
    let v = first_present(value, aliases)?;
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_non_empty_string(value: &Value, aliases: &[&str]) -> Option<String> {
    first_string(value, aliases).filter(|s| !s.trim().is_empty())
}

/// Extract the server-assigned remote id from an upload response.
pub fn remote_id(value: &Value) -> Result<String, ApiError> {
    first_non_empty_string(value, &REMOTE_ID_ALIASES).ok_or_else(|| {
        ApiError::Decode(format!(
            "upload response carries no id under any of {REMOTE_ID_ALIASES:?}"
        ))
    })
}

/// Normalize a status payload.
///
/// Never fails: a payload with no recognizable state field yields an
/// empty state text, which classifies as still-running.
pub fn status_report(value: &Value) -> StatusReport {
    let progress = first_present(value, &PROGRESS_ALIASES)
        .and_then(Value::as_f64)
        .map(|p| p.clamp(0.0, 100.0) as u8);

    StatusReport {
        state_text: first_string(value, &STATE_ALIASES).unwrap_or_default(),
        message: first_non_empty_string(value, &MESSAGE_ALIASES),
        progress,
        artifact_path: first_non_empty_string(value, &ARTIFACT_ALIASES),
    }
}

/// Decode one element of a detail array, skipping malformed entries.
fn lenient_vec<T: serde::de::DeserializeOwned>(value: Option<&Value>) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Normalize the first-pass parse summary.
///
/// Layers may be full objects or bare name strings; blocks may be a
/// name list, an object list, or a map keyed by name.
pub fn parsed_geometry(value: &Value) -> ParsedGeometry {
    let layers = match value.get("layers") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(LayerInfo {
                    name: name.clone(),
                    ..Default::default()
                }),
                other => serde_json::from_value(other.clone()).ok(),
            })
            .collect(),
        _ => Vec::new(),
    };

    let blocks = match value.get("blocks") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name.clone()),
                Value::Object(map) => map.get("name").and_then(Value::as_str).map(String::from),
                _ => None,
            })
            .collect(),
        Some(Value::Object(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let tables = value.get("tables").filter(|t| !t.is_null()).cloned();

    ParsedGeometry {
        layers,
        blocks,
        tables,
    }
}

/// Normalize the entity table payload, dropping non-object rows.
pub fn entity_table(value: &Value) -> EntityTable {
    let columns = match value.get("columns") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    };

    let rows = match value.get("rows") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    };

    EntityTable { columns, rows }
}

fn count(value: &Value, aliases: &[&str]) -> u64 {
    first_present(value, aliases)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Normalize the semantic summary payload.
pub fn semantic_summary(value: &Value) -> SemanticSummary {
    SemanticSummary {
        border_count: count(value, &["border_count", "borderCount"]),
        column_count: count(value, &["column_count", "columnCount"]),
        wall_count: count(value, &["wall_count", "wallCount"]),
        room_count: count(value, &["room_count", "roomCount"]),
        door_count: count(value, &["door_count", "doorCount"]),
        axis_summaries: lenient_vec::<AxisSummary>(value.get("axis_summaries")),
        borders: lenient_vec::<Border>(value.get("borders")),
    }
}
