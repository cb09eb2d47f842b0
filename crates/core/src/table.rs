//! Entity-table view models: column resolution, coordinate extraction,
//! handle statistics, and user-driven sorting.
//!
//! Rows arrive as loosely-typed JSON objects whose column names use
//! arbitrary casing, and whose coordinate-bearing cells may be JSON
//! encoded as strings. All of that tolerance is concentrated here so
//! rendering code sees plain values.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::payload::EntityTable;

type Row = serde_json::Map<String, Value>;

/// Candidate coordinate-bearing column names, scanned in order. The
/// first column that yields a parseable point wins.
pub const COORDINATE_COLUMNS: [&str; 9] = [
    "vertices",
    "startPoint",
    "endPoint",
    "center",
    "position",
    "anchorPoint",
    "middleOfText",
    "linearOrAngularPoint1",
    "linearOrAngularPoint2",
];

/// Placeholder rendered for rows without an extractable coordinate.
pub const NO_COORDINATE: &str = "-";

/// Decimal places used for coordinate display.
const COORD_DECIMALS: i32 = 4;

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Case-insensitive column-name lookup.
///
/// Built from the declared column list, falling back to the keys of
/// the first row when no columns are declared.
#[derive(Debug, Default)]
pub struct ColumnLookup {
    by_lower: HashMap<String, String>,
    columns: Vec<String>,
}

impl ColumnLookup {
    pub fn for_table(table: &EntityTable) -> Self {
        let columns: Vec<String> = if !table.columns.is_empty() {
            table.columns.clone()
        } else {
            table
                .rows
                .first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default()
        };

        let by_lower = columns
            .iter()
            .map(|c| (c.to_lowercase(), c.clone()))
            .collect();

        Self { by_lower, columns }
    }

    /// Resolve a column name regardless of casing.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_lower.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The effective column list, in declared (or first-row) order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Fetch a cell by column name, ignoring the row key's casing.
pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    if let Some(v) = row.get(column) {
        return Some(v);
    }
    row.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(column))
        .map(|(_, v)| v)
}

// ---------------------------------------------------------------------------
// Coordinate extraction
// ---------------------------------------------------------------------------

/// A first-class coordinate triple extracted from a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Round a coordinate component for display.
pub fn round4(v: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (v * scale).round() / scale
}

/// If a string cell looks like embedded JSON, parse it; otherwise keep
/// the original value.
fn sniff_json(value: &Value) -> Value {
    if let Value::String(s) = value {
        let trimmed = s.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                return parsed;
            }
        }
    }
    value.clone()
}

fn point_from_object(map: &Row) -> Option<Point3> {
    let x = cell(map, "x").and_then(Value::as_f64)?;
    let y = cell(map, "y").and_then(Value::as_f64)?;
    let z = cell(map, "z").and_then(Value::as_f64).unwrap_or(0.0);
    Some(Point3 { x, y, z })
}

fn point_from_value(value: &Value) -> Option<Point3> {
    match value {
        Value::Object(map) => point_from_object(map),
        Value::Array(items) => match items.first() {
            // A bare numeric array is itself a point.
            Some(Value::Number(_)) => {
                let x = items.first().and_then(Value::as_f64)?;
                let y = items.get(1).and_then(Value::as_f64)?;
                let z = items.get(2).and_then(Value::as_f64).unwrap_or(0.0);
                Some(Point3 { x, y, z })
            }
            // A vertex list: take the first vertex.
            Some(first) => point_from_value(first),
            None => None,
        },
        _ => None,
    }
}

/// Extract a coordinate triple from a row by scanning the fixed
/// candidate column list. Returns `None` when no candidate yields a
/// point; callers render [`NO_COORDINATE`] in that case.
pub fn extract_coordinate(row: &Row) -> Option<Point3> {
    for column in COORDINATE_COLUMNS {
        if let Some(raw) = cell(row, column) {
            if let Some(point) = point_from_value(&sniff_json(raw)) {
                return Some(point);
            }
        }
    }
    None
}

/// Display form of an extracted coordinate, rounded to 4 decimals.
pub fn format_coordinate(point: Option<Point3>) -> String {
    match point {
        Some(p) => format!(
            "({}, {}, {})",
            round4(p.x),
            round4(p.y),
            round4(p.z)
        ),
        None => NO_COORDINATE.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Handle statistics
// ---------------------------------------------------------------------------

/// Number of distinct non-empty handle values across the rows, falling
/// back to the row count when no handle values exist at all.
pub fn distinct_handle_count(table: &EntityTable) -> usize {
    let lookup = ColumnLookup::for_table(table);
    let handle_column = lookup.resolve("handle").unwrap_or("handle");

    let mut handles: HashSet<String> = HashSet::new();
    for row in &table.rows {
        if let Some(value) = cell(row, handle_column) {
            let text = value_display(value);
            if !text.is_empty() {
                handles.insert(text);
            }
        }
    }

    if handles.is_empty() {
        table.rows.len()
    } else {
        handles.len()
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Per-table sort selection: which column, which way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: String,
    pub direction: SortDirection,
}

impl SortState {
    /// Next state after clicking `column`: the active column flips
    /// direction, a new column resets to ascending.
    pub fn toggled(current: Option<&SortState>, column: &str) -> SortState {
        match current {
            Some(state) if state.column == column => SortState {
                column: column.to_string(),
                direction: state.direction.flipped(),
            },
            _ => SortState {
                column: column.to_string(),
                direction: SortDirection::Ascending,
            },
        }
    }
}

fn value_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Compare two cells: numeric when both are numbers, otherwise a
/// natural string comparison with numeric-substring awareness
/// ("A2" sorts before "A10").
pub fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(na), Some(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
        _ => {
            let sa = a.map(value_display).unwrap_or_default();
            let sb = b.map(value_display).unwrap_or_default();
            natural_cmp(&sa, &sb)
        }
    }
}

/// Sort rows in place according to the given sort state.
pub fn sort_rows(rows: &mut [Row], state: &SortState) {
    rows.sort_by(|a, b| {
        let ordering = compare_cells(cell(a, &state.column), cell(b, &state.column));
        match state.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut n: u64 = 0;
    while let Some(c) = chars.peek().copied() {
        let Some(digit) = c.to_digit(10) else { break };
        n = n.saturating_mul(10).saturating_add(u64::from(digit));
        chars.next();
    }
    n
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().peekable();
    let mut cb = b.chars().peekable();
    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_number(&mut ca);
                let nb = take_number(&mut cb);
                match na.cmp(&nb) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                let lx = x.to_ascii_lowercase();
                let ly = y.to_ascii_lowercase();
                match lx.cmp(&ly) {
                    Ordering::Equal => {
                        ca.next();
                        cb.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().expect("test row must be an object").clone()
    }

    fn table(columns: &[&str], rows: Vec<Value>) -> EntityTable {
        EntityTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into_iter().map(row).collect(),
        }
    }

    // -- column resolution --

    #[test]
    fn declared_columns_resolve_case_insensitively() {
        let t = table(&["Handle", "Type", "Layer"], vec![]);
        let lookup = ColumnLookup::for_table(&t);
        assert_eq!(lookup.resolve("handle"), Some("Handle"));
        assert_eq!(lookup.resolve("LAYER"), Some("Layer"));
        assert_eq!(lookup.resolve("missing"), None);
    }

    #[test]
    fn columns_fall_back_to_first_row_keys() {
        let t = table(&[], vec![json!({"handle": "A1", "type": "LINE"})]);
        let lookup = ColumnLookup::for_table(&t);
        assert_eq!(lookup.columns().len(), 2);
        assert_eq!(lookup.resolve("TYPE"), Some("type"));
    }

    #[test]
    fn cell_lookup_ignores_row_key_casing() {
        let r = row(json!({"Handle": "2F"}));
        assert_eq!(cell(&r, "handle"), Some(&json!("2F")));
    }

    // -- coordinate extraction --

    #[test]
    fn coordinate_from_json_encoded_object() {
        let r = row(json!({"center": "{\"x\":1.23456,\"y\":2,\"z\":0}"}));
        let p = extract_coordinate(&r).unwrap();
        assert_eq!(round4(p.x), 1.2346);
        assert_eq!(p.y, 2.0);
    }

    #[test]
    fn coordinate_from_vertex_list_takes_first_vertex() {
        let r = row(json!({"vertices": [{"x": 3.0, "y": 4.0}, {"x": 9.0, "y": 9.0}]}));
        let p = extract_coordinate(&r).unwrap();
        assert_eq!((p.x, p.y, p.z), (3.0, 4.0, 0.0));
    }

    #[test]
    fn coordinate_from_numeric_array() {
        let r = row(json!({"position": [1.5, 2.5, 3.5]}));
        let p = extract_coordinate(&r).unwrap();
        assert_eq!((p.x, p.y, p.z), (1.5, 2.5, 3.5));
    }

    #[test]
    fn candidate_order_is_respected() {
        // startPoint comes before center in the candidate list.
        let r = row(json!({
            "center": {"x": 9.0, "y": 9.0},
            "startPoint": {"x": 1.0, "y": 1.0},
        }));
        let p = extract_coordinate(&r).unwrap();
        assert_eq!(p.x, 1.0);
    }

    #[test]
    fn row_without_candidates_yields_placeholder() {
        let r = row(json!({"handle": "A1", "text": "hello"}));
        assert_eq!(extract_coordinate(&r), None);
        assert_eq!(format_coordinate(None), NO_COORDINATE);
    }

    #[test]
    fn malformed_json_string_is_ignored() {
        let r = row(json!({"center": "{not json"}));
        assert_eq!(extract_coordinate(&r), None);
    }

    #[test]
    fn display_rounds_to_four_decimals() {
        let p = Point3 { x: 1.23456, y: 2.0, z: 0.0 };
        assert_eq!(format_coordinate(Some(p)), "(1.2346, 2, 0)");
    }

    // -- distinct handles --

    #[test]
    fn distinct_handles_counted() {
        let t = table(
            &["handle"],
            vec![
                json!({"handle": "A1"}),
                json!({"handle": "A1"}),
                json!({"handle": "B2"}),
            ],
        );
        assert_eq!(distinct_handle_count(&t), 2);
    }

    #[test]
    fn no_handles_falls_back_to_row_count() {
        let t = table(&["type"], vec![json!({}), json!({})]);
        assert_eq!(distinct_handle_count(&t), 2);
    }

    #[test]
    fn empty_handle_values_do_not_count() {
        let t = table(
            &["handle"],
            vec![json!({"handle": ""}), json!({"handle": "A1"})],
        );
        assert_eq!(distinct_handle_count(&t), 1);
    }

    #[test]
    fn handle_column_resolves_case_insensitively() {
        let t = table(&["Handle"], vec![json!({"Handle": "A1"}), json!({"Handle": "B2"})]);
        assert_eq!(distinct_handle_count(&t), 2);
    }

    // -- sorting --

    #[test]
    fn toggle_cycle_asc_desc_asc() {
        let first = SortState::toggled(None, "radius");
        assert_eq!(first.direction, SortDirection::Ascending);
        let second = SortState::toggled(Some(&first), "radius");
        assert_eq!(second.direction, SortDirection::Descending);
        let third = SortState::toggled(Some(&second), "radius");
        assert_eq!(third.direction, SortDirection::Ascending);
    }

    #[test]
    fn new_column_resets_to_ascending() {
        let state = SortState {
            column: "radius".into(),
            direction: SortDirection::Descending,
        };
        let next = SortState::toggled(Some(&state), "layer");
        assert_eq!(next.column, "layer");
        assert_eq!(next.direction, SortDirection::Ascending);
    }

    #[test]
    fn numeric_columns_sort_numerically() {
        let mut rows: Vec<Row> = vec![
            row(json!({"radius": 10.0})),
            row(json!({"radius": 2.0})),
            row(json!({"radius": 30.0})),
        ];
        sort_rows(
            &mut rows,
            &SortState {
                column: "radius".into(),
                direction: SortDirection::Ascending,
            },
        );
        let radii: Vec<f64> = rows
            .iter()
            .map(|r| r["radius"].as_f64().unwrap())
            .collect();
        assert_eq!(radii, vec![2.0, 10.0, 30.0]);

        sort_rows(
            &mut rows,
            &SortState {
                column: "radius".into(),
                direction: SortDirection::Descending,
            },
        );
        let radii: Vec<f64> = rows
            .iter()
            .map(|r| r["radius"].as_f64().unwrap())
            .collect();
        assert_eq!(radii, vec![30.0, 10.0, 2.0]);
    }

    #[test]
    fn string_sort_is_numeric_substring_aware() {
        let mut rows: Vec<Row> = vec![
            row(json!({"handle": "A10"})),
            row(json!({"handle": "A2"})),
            row(json!({"handle": "A1"})),
        ];
        sort_rows(
            &mut rows,
            &SortState {
                column: "handle".into(),
                direction: SortDirection::Ascending,
            },
        );
        let handles: Vec<&str> = rows.iter().map(|r| r["handle"].as_str().unwrap()).collect();
        assert_eq!(handles, vec!["A1", "A2", "A10"]);
    }

    #[test]
    fn missing_cells_sort_first_ascending() {
        let mut rows: Vec<Row> = vec![
            row(json!({"layer": "WALL"})),
            row(json!({})),
        ];
        sort_rows(
            &mut rows,
            &SortState {
                column: "layer".into(),
                direction: SortDirection::Ascending,
            },
        );
        assert!(rows[0].get("layer").is_none());
    }
}
