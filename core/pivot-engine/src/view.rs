//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - Renderable output for the rendering layer.
//!
//! The projector flattens the tree into rows that carry everything a
//! renderer needs without looking at the tree again:
//! - Row kind (grand total vs. group)
//! - Display cells aligned to the headers
//! - Hierarchy metadata (depth, key, path, expand/collapse hints)
//! - Highlight hints (active drill-through filter, search hit)

use serde::{Deserialize, Serialize};

use crate::definition::SortSpec;

/// Key of the synthetic grand total row.
pub const TOTAL_ROW_KEY: &str = "::total";

/// Label of the synthetic grand total row.
pub const TOTAL_ROW_NAME: &str = "Total";

/// Header of the hierarchy column.
pub const HIERARCHY_HEADER: &str = "Hierarchy";

/// Deepest indent level a renderer needs to distinguish.
pub const MAX_INDENT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Grand total, built from the root aggregate.
    Total,
    /// A node of the hierarchy.
    Group,
}

/// Hierarchy metadata attached to every emitted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowMeta {
    pub depth: usize,
    pub key: String,
    pub name: String,
    pub path: Vec<String>,
    pub has_children: bool,

    /// Key is in the expansion state (drives the toggle glyph).
    pub is_expanded: bool,

    /// Path equals the drill-through path currently applied on the host.
    pub is_active_filter: bool,

    /// The node's own name matches the active search.
    pub is_search_hit: bool,

    /// min(depth - 1, MAX_INDENT); 0 for the total row.
    pub indent: usize,
}

impl RowMeta {
    pub fn total() -> Self {
        RowMeta {
            depth: 0,
            key: TOTAL_ROW_KEY.to_string(),
            name: TOTAL_ROW_NAME.to_string(),
            path: Vec::new(),
            has_children: false,
            is_expanded: false,
            is_active_filter: false,
            is_search_hit: false,
            indent: 0,
        }
    }
}

/// One display row. `cells[0]` is the label, `cells[1..]` the formatted
/// measures, aligned with `PivotView::headers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub kind: RowKind,
    pub cells: Vec<String>,
    pub meta: RowMeta,
}

impl ViewRow {
    pub fn is_total(&self) -> bool {
        self.kind == RowKind::Total
    }

    /// Only group rows can be clicked for drill-through.
    pub fn filter_path(&self) -> Option<&[String]> {
        match self.kind {
            RowKind::Group => Some(&self.meta.path),
            RowKind::Total => None,
        }
    }
}

/// Pagination over top-level groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerInfo {
    pub total_top_level: usize,
    pub page_size: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

impl PagerInfo {
    pub fn new(total_top_level: usize, page_size: usize, current_page: usize) -> Self {
        let page_size = page_size.max(1);
        PagerInfo {
            total_top_level,
            page_size,
            current_page,
            total_pages: total_top_level.div_ceil(page_size),
        }
    }

    /// The pager is only rendered when there is more than one page.
    pub fn is_visible(&self) -> bool {
        self.total_top_level > self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// The complete projection handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotView {
    pub headers: Vec<String>,
    pub rows: Vec<ViewRow>,
    pub pager: PagerInfo,
    pub sort: SortSpec,
}

impl PivotView {
    /// Group rows only, in display order.
    pub fn group_rows(&self) -> impl Iterator<Item = &ViewRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Group)
    }

    pub fn find_row(&self, key: &str) -> Option<&ViewRow> {
        self.group_rows().find(|r| r.meta.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_bounds() {
        let pager = PagerInfo::new(23, 10, 1);
        assert_eq!(pager.total_pages, 3);
        assert!(pager.is_visible());
        assert!(!pager.has_previous());
        assert!(pager.has_next());

        let last = PagerInfo::new(23, 10, 3);
        assert!(last.has_previous());
        assert!(!last.has_next());
    }

    #[test]
    fn test_pager_hidden_for_single_page() {
        let pager = PagerInfo::new(10, 10, 1);
        assert_eq!(pager.total_pages, 1);
        assert!(!pager.is_visible());
        assert_eq!(PagerInfo::new(0, 10, 1).total_pages, 0);
    }

    #[test]
    fn test_total_row_is_not_clickable() {
        let row = ViewRow {
            kind: RowKind::Total,
            cells: vec![TOTAL_ROW_NAME.to_string()],
            meta: RowMeta::total(),
        };
        assert!(row.is_total());
        assert!(row.filter_path().is_none());
    }
}
