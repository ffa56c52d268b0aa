//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - projects the aggregation tree into a flat, renderable view.
//!
//! This module takes an AggregationNode (data), ViewOptions and
//! ExpansionState (user intent) and produces a PivotView.
//!
//! Algorithm:
//! 1. Build headers from the measure order
//! 2. Emit the grand total row if enabled (never sorted, searched or paged)
//! 3. Sort the top-level groups, then slice out the current page
//! 4. Walk each kept group depth-first, emitting nodes that match the search
//!    or lead to a match, descending into open (or search-expanded) nodes

use std::cmp::Ordering;
use std::ops::Range;

use crate::definition::{FieldIndex, SortDirection, SortKey, ViewOptions};
use crate::expansion::ExpansionState;
use crate::format::format_measure;
use crate::text::{locale_compare, normalize};
use crate::tree::AggregationNode;
use crate::view::{
    PagerInfo, PivotView, RowKind, RowMeta, ViewRow, HIERARCHY_HEADER, MAX_INDENT,
};

// ============================================================================
// HEADERS
// ============================================================================

/// Header label for a measure column: the text inside the last
/// parenthesized group, else the raw name. "SUM(Sales)" -> "Sales".
pub fn measure_label(name: &str) -> String {
    let Some(close) = name.rfind(')') else {
        return name.to_string();
    };
    let Some(open) = name[..close].rfind('(') else {
        return name.to_string();
    };
    let inner = &name[open + 1..close];
    if inner.is_empty() {
        name.to_string()
    } else {
        inner.to_string()
    }
}

/// `["Hierarchy", <one label per measure>]`.
pub fn build_headers<S: AsRef<str>>(column_names: &[S], measures: &[FieldIndex]) -> Vec<String> {
    let mut headers = Vec::with_capacity(measures.len() + 1);
    headers.push(HIERARCHY_HEADER.to_string());
    for &m in measures {
        let name = column_names.get(m).map(|n| n.as_ref()).unwrap_or("");
        headers.push(measure_label(name));
    }
    headers
}

// ============================================================================
// SORTING & PAGING
// ============================================================================

/// Orders sibling nodes. Ties keep their first-seen order.
pub fn sort_nodes(nodes: &mut [&AggregationNode], key: SortKey, direction: SortDirection) {
    let compare = |a: &&AggregationNode, b: &&AggregationNode| -> Ordering {
        match key {
            SortKey::Unsorted => Ordering::Equal,
            SortKey::Name => locale_compare(&a.name, &b.name),
            SortKey::Measure(m) => {
                let va = a.aggregate.get(m).copied().unwrap_or(0.0);
                let vb = b.aggregate.get(m).copied().unwrap_or(0.0);
                va.partial_cmp(&vb).unwrap_or(Ordering::Equal)
            }
        }
    };

    if key == SortKey::Unsorted {
        return;
    }

    match direction {
        SortDirection::Ascending => nodes.sort_by(compare),
        SortDirection::Descending => nodes.sort_by(|a, b| compare(b, a)),
    }
}

/// Index range of top-level groups on a 1-based page, clamped to `total`.
pub fn page_range(total: usize, page_size: usize, current_page: usize) -> Range<usize> {
    let page_size = page_size.max(1);
    let start = current_page.saturating_sub(1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    start..end
}

// ============================================================================
// VIEW PROJECTOR
// ============================================================================

/// Projection of one tree under one set of view inputs.
pub struct ViewProjector<'a> {
    root: &'a AggregationNode,
    headers: Vec<String>,
    options: &'a ViewOptions,
    expansion: &'a ExpansionState,
    active_path: Option<&'a [String]>,

    /// Normalized search text; empty means no search.
    search: String,
}

impl<'a> ViewProjector<'a> {
    pub fn new(
        root: &'a AggregationNode,
        headers: Vec<String>,
        options: &'a ViewOptions,
        expansion: &'a ExpansionState,
        active_path: Option<&'a [String]>,
    ) -> Self {
        ViewProjector {
            root,
            headers,
            options,
            expansion,
            active_path,
            search: normalize(&options.search),
        }
    }

    /// Executes the projection and returns the view.
    pub fn project(&self) -> PivotView {
        let mut rows = Vec::new();

        // Step 1: Grand total
        if self.options.show_grand_total {
            rows.push(self.total_row());
        }

        // Step 2: Sort top-level groups
        let mut top_level: Vec<&AggregationNode> = self.root.children().iter().collect();
        sort_nodes(
            &mut top_level,
            self.options.sort.key(),
            self.options.sort.direction,
        );

        // Step 3: Page
        let pager = PagerInfo::new(
            top_level.len(),
            self.options.page_size,
            self.options.current_page,
        );
        let range = page_range(top_level.len(), pager.page_size, pager.current_page);

        // Step 4: Depth-first walk of the kept groups
        for node in &top_level[range] {
            self.walk(node, &mut rows);
        }

        PivotView {
            headers: self.headers.clone(),
            rows,
            pager,
            sort: self.options.sort,
        }
    }

    fn search_active(&self) -> bool {
        !self.search.is_empty()
    }

    /// The node's own name matches the search.
    fn is_hit(&self, node: &AggregationNode) -> bool {
        self.search_active() && normalize(&node.name).contains(self.search.as_str())
    }

    /// The node or any descendant matches; everything matches without search.
    fn has_match(&self, node: &AggregationNode) -> bool {
        if !self.search_active() {
            return true;
        }
        self.is_hit(node) || node.children().iter().any(|c| self.has_match(c))
    }

    fn walk(&self, node: &AggregationNode, out: &mut Vec<ViewRow>) {
        if !self.has_match(node) {
            return;
        }

        out.push(self.group_row(node));

        let auto_expand =
            self.search_active() && node.children().iter().any(|c| self.has_match(c));

        if self.expansion.is_open(&node.key) || auto_expand {
            for child in node.children() {
                self.walk(child, out);
            }
        }
    }

    fn measure_cells(&self, node: &AggregationNode, label: &str) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.headers.len());
        cells.push(label.to_string());
        for i in 0..self.headers.len().saturating_sub(1) {
            let value = node.aggregate.get(i).copied().unwrap_or(0.0);
            cells.push(format_measure(value));
        }
        cells
    }

    fn total_row(&self) -> ViewRow {
        let meta = RowMeta::total();
        ViewRow {
            kind: RowKind::Total,
            cells: self.measure_cells(self.root, &meta.name),
            meta,
        }
    }

    fn group_row(&self, node: &AggregationNode) -> ViewRow {
        let is_active_filter = self
            .active_path
            .map(|p| p == node.path.as_slice())
            .unwrap_or(false);

        ViewRow {
            kind: RowKind::Group,
            cells: self.measure_cells(node, &node.name),
            meta: RowMeta {
                depth: node.depth,
                key: node.key.clone(),
                name: node.name.clone(),
                path: node.path.clone(),
                has_children: node.has_children(),
                is_expanded: self.expansion.is_open(&node.key),
                is_active_filter,
                is_search_hit: self.is_hit(node),
                indent: node.depth.saturating_sub(1).min(MAX_INDENT),
            },
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Projects a tree into a view.
/// This is the main entry point for the projection engine.
pub fn project_view(
    root: &AggregationNode,
    headers: Vec<String>,
    options: &ViewOptions,
    expansion: &ExpansionState,
    active_path: Option<&[String]>,
) -> PivotView {
    ViewProjector::new(root, headers, options, expansion, active_path).project()
}
