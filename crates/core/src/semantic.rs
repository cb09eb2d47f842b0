//! Cross-file semantic entry aggregation.
//!
//! Each analyze job's semantic summary is flattened into a list of
//! [`SemanticEntry`] values for unified browsing: one entry per
//! axis-summary item when any exist, otherwise one entry per raw
//! border. Entries from all jobs are concatenated in job insertion
//! order, and a single global selection index is clamped into range on
//! every rebuild.

use crate::bbox::BoundingBox;
use crate::job::{JobId, JobStore};
use crate::payload::{AxisSummary, Border, SemanticSummary};

/// One border/axis-summary unit of structural analysis, merged across
/// files.
#[derive(Debug, Clone)]
pub struct SemanticEntry {
    /// Owning job in the store (non-owning back-reference).
    pub source_job: JobId,
    /// 1-based border index: the explicit index field when present,
    /// positional order otherwise.
    pub border_index: usize,
    pub axis_summary: Option<AxisSummary>,
    pub border: Option<Border>,
    /// Resolved from the candidate bbox fields in priority order:
    /// `bbox_world`, then the axis summary's `bbox`, then `bbox`,
    /// then `bbox_local`.
    pub bounding_box: Option<BoundingBox>,
}

fn resolve_bbox(axis: Option<&AxisSummary>, border: Option<&Border>) -> Option<BoundingBox> {
    border
        .and_then(|b| b.bbox_world)
        .or_else(|| axis.and_then(|a| a.bbox))
        .or_else(|| border.and_then(|b| b.bbox))
        .or_else(|| border.and_then(|b| b.bbox_local))
}

/// Find the border matching a 1-based index: explicit `border_index`
/// field first, positional order as fallback.
fn border_for_index(borders: &[Border], index: usize) -> Option<&Border> {
    borders
        .iter()
        .find(|b| b.border_index == Some(index))
        .or_else(|| borders.get(index.checked_sub(1)?))
}

/// Entries for a single job's summary, axis-summaries first.
pub fn entries_for_job(source_job: JobId, summary: &SemanticSummary) -> Vec<SemanticEntry> {
    if !summary.axis_summaries.is_empty() {
        summary
            .axis_summaries
            .iter()
            .enumerate()
            .map(|(pos, axis)| {
                let border_index = axis.border_index.unwrap_or(pos + 1);
                let border = border_for_index(&summary.borders, border_index).cloned();
                SemanticEntry {
                    source_job,
                    border_index,
                    bounding_box: resolve_bbox(Some(axis), border.as_ref()),
                    axis_summary: Some(axis.clone()),
                    border,
                }
            })
            .collect()
    } else {
        summary
            .borders
            .iter()
            .enumerate()
            .map(|(pos, border)| SemanticEntry {
                source_job,
                border_index: border.border_index.unwrap_or(pos + 1),
                axis_summary: None,
                bounding_box: resolve_bbox(None, Some(border)),
                border: Some(border.clone()),
            })
            .collect()
    }
}

/// Rebuild the cross-file entry list from every analyze job that has a
/// cached semantic summary, in insertion order.
pub fn build_entries(store: &JobStore) -> Vec<SemanticEntry> {
    let mut entries = Vec::new();
    for (id, job) in store.analyze_jobs() {
        if let Some(summary) = job.semantic_summary.get() {
            entries.extend(entries_for_job(id, summary));
        }
    }
    entries
}

/// The single globally selected entry, kept in range across rebuilds.
#[derive(Debug, Default, Clone, Copy)]
pub struct Selection {
    index: usize,
}

impl Selection {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Select an entry; the stored index is clamped on the next
    /// [`Selection::clamp`] if the list shrinks.
    pub fn select(&mut self, index: usize) {
        self.index = index;
    }

    /// Clamp into `[0, len - 1]` (0 when the list is empty) so a stale
    /// selection never indexes out of range.
    pub fn clamp(&mut self, len: usize) {
        self.index = self.index.min(len.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobKind, JobRecord};

    fn bbox(xmin: f64) -> BoundingBox {
        BoundingBox {
            xmin,
            ymin: 0.0,
            xmax: xmin + 100.0,
            ymax: 50.0,
        }
    }

    fn axis(border_index: Option<usize>) -> AxisSummary {
        AxisSummary {
            border_index,
            ..Default::default()
        }
    }

    fn border(border_index: Option<usize>, world: Option<BoundingBox>) -> Border {
        Border {
            border_index,
            bbox_world: world,
            ..Default::default()
        }
    }

    // -- derivation priority --

    #[test]
    fn axis_summaries_take_priority_over_borders() {
        let summary = SemanticSummary {
            axis_summaries: vec![axis(Some(1))],
            borders: vec![border(Some(1), None), border(Some(2), None)],
            ..Default::default()
        };
        let entries = entries_for_job(0, &summary);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].axis_summary.is_some());
    }

    #[test]
    fn borders_are_the_fallback() {
        let summary = SemanticSummary {
            borders: vec![border(None, None), border(None, None)],
            ..Default::default()
        };
        let entries = entries_for_job(3, &summary);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].border_index, 1);
        assert_eq!(entries[1].border_index, 2);
        assert_eq!(entries[0].source_job, 3);
    }

    #[test]
    fn empty_summary_yields_no_entries() {
        let entries = entries_for_job(0, &SemanticSummary::default());
        assert!(entries.is_empty());
    }

    // -- border join --

    #[test]
    fn axis_entry_carries_the_matching_borders_world_bbox() {
        let summary = SemanticSummary {
            axis_summaries: vec![axis(Some(2))],
            borders: vec![border(Some(1), Some(bbox(0.0))), border(Some(2), Some(bbox(500.0)))],
            ..Default::default()
        };
        let entries = entries_for_job(0, &summary);
        assert_eq!(entries[0].border_index, 2);
        assert_eq!(entries[0].bounding_box, Some(bbox(500.0)));
    }

    #[test]
    fn border_join_falls_back_to_position() {
        // No explicit indices on the borders: the second axis summary
        // joins the second border positionally.
        let summary = SemanticSummary {
            axis_summaries: vec![axis(None), axis(None)],
            borders: vec![border(None, Some(bbox(0.0))), border(None, Some(bbox(500.0)))],
            ..Default::default()
        };
        let entries = entries_for_job(0, &summary);
        assert_eq!(entries[1].border_index, 2);
        assert_eq!(entries[1].bounding_box, Some(bbox(500.0)));
    }

    #[test]
    fn bbox_priority_world_then_axis_then_local() {
        let axis_with_bbox = AxisSummary {
            border_index: Some(1),
            bbox: Some(bbox(100.0)),
            ..Default::default()
        };
        // No world bbox on the border: the axis bbox wins over local.
        let b = Border {
            border_index: Some(1),
            bbox_local: Some(bbox(900.0)),
            ..Default::default()
        };
        let summary = SemanticSummary {
            axis_summaries: vec![axis_with_bbox],
            borders: vec![b],
            ..Default::default()
        };
        let entries = entries_for_job(0, &summary);
        assert_eq!(entries[0].bounding_box, Some(bbox(100.0)));
    }

    // -- cross-file aggregation --

    #[test]
    fn entries_follow_job_insertion_order() {
        let mut store = JobStore::new();
        let first = store.add(JobRecord::new("a.dxf", Vec::new(), JobKind::Analyze, None));
        let second = store.add(JobRecord::new("b.dxf", Vec::new(), JobKind::Analyze, None));

        let summary_one = SemanticSummary {
            borders: vec![border(None, None)],
            ..Default::default()
        };
        let summary_two = SemanticSummary {
            borders: vec![border(None, None), border(None, None)],
            ..Default::default()
        };
        store
            .get_mut(first)
            .unwrap()
            .semantic_summary
            .settle(Some(summary_one));
        store
            .get_mut(second)
            .unwrap()
            .semantic_summary
            .settle(Some(summary_two));

        let entries = build_entries(&store);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source_job, first);
        assert_eq!(entries[1].source_job, second);
        assert_eq!(entries[2].source_job, second);
    }

    #[test]
    fn jobs_without_summaries_contribute_nothing() {
        let mut store = JobStore::new();
        store.add(JobRecord::new("a.dxf", Vec::new(), JobKind::Analyze, None));
        assert!(build_entries(&store).is_empty());
    }

    // -- selection clamping --

    #[test]
    fn stale_selection_is_clamped_into_range() {
        let mut selection = Selection::default();
        selection.select(5);
        selection.clamp(2);
        assert_eq!(selection.index(), 1);
    }

    #[test]
    fn selection_on_empty_list_clamps_to_zero() {
        let mut selection = Selection::default();
        selection.select(4);
        selection.clamp(0);
        assert_eq!(selection.index(), 0);
    }

    #[test]
    fn in_range_selection_is_untouched() {
        let mut selection = Selection::default();
        selection.select(1);
        selection.clamp(3);
        assert_eq!(selection.index(), 1);
    }
}
