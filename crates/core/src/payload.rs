//! Typed models for the backend's loosely-shaped result payloads.
//!
//! The tolerant decoding itself (field aliases, JSON-string sniffing)
//! happens at the system boundary in `drawbridge-client`; these are
//! the normalized shapes the rest of the client works with. Each
//! artifact type knows its own readiness predicate, used by the
//! eventual-result fetcher to decide whether a payload has
//! materialized yet.

use serde::Deserialize;

use crate::bbox::BoundingBox;

// ---------------------------------------------------------------------------
// Parsed geometry (GET parsing/{id}/parsed1)
// ---------------------------------------------------------------------------

/// One layer from the parsed document's layer table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerInfo {
    #[serde(default)]
    pub name: String,
    /// ACI color index as stored in the source document.
    #[serde(default, alias = "colorIndex")]
    pub color: i64,
    #[serde(default, alias = "lineType")]
    pub linetype: Option<String>,
}

/// Summary of the first-pass geometry parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedGeometry {
    pub layers: Vec<LayerInfo>,
    /// Block definition names.
    pub blocks: Vec<String>,
    /// Raw tables section, passed through untouched when present.
    pub tables: Option<serde_json::Value>,
}

impl ParsedGeometry {
    /// The backend materialized something worth keeping.
    pub fn is_ready(&self) -> bool {
        !self.layers.is_empty() || !self.blocks.is_empty() || self.tables.is_some()
    }
}

// ---------------------------------------------------------------------------
// Entity table (GET parsing/{id}/entities-table)
// ---------------------------------------------------------------------------

/// The flattened per-entity table: declared column names plus
/// loosely-typed rows whose keys may use arbitrary casing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityTable {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl EntityTable {
    /// An empty row list means the extraction has not materialized yet.
    pub fn is_ready(&self) -> bool {
        !self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Semantic summary (GET parsing/{id}/semantic-summary)
// ---------------------------------------------------------------------------

/// One detected grid axis line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AxisLine {
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, alias = "layerName")]
    pub layer: Option<String>,
    #[serde(default)]
    pub coord: f64,
    /// Assigned grid label ("X1", "Y3", ...).
    #[serde(default)]
    pub label: Option<String>,
}

/// Grid-axis analysis for one border region.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AxisSummary {
    /// 1-based index of the border this summary belongs to.
    #[serde(default, alias = "borderIndex")]
    pub border_index: Option<usize>,
    #[serde(default)]
    pub x_axes: Vec<AxisLine>,
    #[serde(default)]
    pub y_axes: Vec<AxisLine>,
    #[serde(default)]
    pub x_spacing: Vec<f64>,
    #[serde(default)]
    pub y_spacing: Vec<f64>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

/// One detected border (title block) placement.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Border {
    #[serde(default, alias = "borderIndex")]
    pub border_index: Option<usize>,
    #[serde(default)]
    pub block_name: Option<String>,
    #[serde(default)]
    pub insert_handle: Option<String>,
    #[serde(default)]
    pub bbox_world: Option<BoundingBox>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub bbox_local: Option<BoundingBox>,
}

/// AI/rule-derived structural analysis for one file: object counts
/// plus optional per-border detail arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemanticSummary {
    #[serde(default)]
    pub border_count: u64,
    #[serde(default)]
    pub column_count: u64,
    #[serde(default)]
    pub wall_count: u64,
    #[serde(default)]
    pub room_count: u64,
    #[serde(default)]
    pub door_count: u64,
    #[serde(default)]
    pub axis_summaries: Vec<AxisSummary>,
    #[serde(default)]
    pub borders: Vec<Border>,
}

impl SemanticSummary {
    /// Any non-zero count or non-empty detail array counts as ready.
    pub fn is_ready(&self) -> bool {
        self.border_count > 0
            || self.column_count > 0
            || self.wall_count > 0
            || self.room_count > 0
            || self.door_count > 0
            || !self.axis_summaries.is_empty()
            || !self.borders.is_empty()
    }
}
