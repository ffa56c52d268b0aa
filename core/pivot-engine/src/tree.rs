//! FILENAME: core/pivot-engine/src/tree.rs
//! Aggregation Tree - rollup of host rows keyed by ordered dimension values.
//!
//! Architecture:
//! - One node per distinct ancestor-value sequence, so a node is identified
//!   by its path alone
//! - Children are kept in first-seen order (a Vec) with a hash index on the
//!   side for O(1) lookup during the fold
//! - Measures are added at every depth while descending, which gives rollup
//!   semantics in a single pass over the rows
//! - The root total is the sum of its direct children; this relies on the
//!   children partitioning every row, which holds as long as every row is
//!   folded and at least one dimension exists

use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::definition::{CellValue, Row};
use crate::ordering::FieldOrder;

/// Separator joining path values into a node key.
pub const KEY_SEPARATOR: char = '\0';

/// Per-measure sums for a node, indexed by position in the measure order.
pub type Aggregate = SmallVec<[f64; 4]>;

/// Composite key of a path: every ancestor value including the node's own.
pub fn node_key<S: AsRef<str>>(path: &[S]) -> String {
    let mut key = String::new();
    for (i, value) in path.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(value.as_ref());
    }
    key
}

// ============================================================================
// NUMERIC COERCION
// ============================================================================

/// Reads a measure cell as a number. Empty and unparsable cells count as 0;
/// text keeps only digits, '.' and '-' before parsing ("$1,234.50" -> 1234.5).
pub fn to_number(cell: &CellValue) -> f64 {
    match cell {
        CellValue::Empty => 0.0,
        CellValue::Number(n) => *n,
        CellValue::Text(s) => {
            if s.is_empty() {
                return 0.0;
            }
            let stripped: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            parse_leading_float(&stripped).unwrap_or(0.0)
        }
    }
}

/// Parses the longest numeric prefix (`-?digits[.digits]`), ignoring any
/// trailing garbage: "12.5.3" -> 12.5, "3-4" -> 3, "-" -> None.
fn parse_leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut digits = 0;

    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        let mut frac_digits = 0;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
            frac_digits += 1;
        }
        if frac_digits > 0 || digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        return None;
    }
    s[..end].trim_end_matches('.').parse::<f64>().ok()
}

// ============================================================================
// AGGREGATION NODE
// ============================================================================

/// One group in the hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationNode {
    /// `node_key(path)`; empty for the root.
    pub key: String,

    /// The dimension value this node groups on.
    pub name: String,

    /// 0 for the root, 1 for top-level groups.
    pub depth: usize,

    /// Values from the root down to and including this node.
    pub path: Vec<String>,

    /// Rolled-up measure sums.
    pub aggregate: Aggregate,

    /// Children in first-seen order.
    children: Vec<AggregationNode>,

    /// Child value -> position in `children`.
    #[serde(skip)]
    child_index: FxHashMap<String, usize>,
}

impl AggregationNode {
    fn root(measure_count: usize) -> Self {
        AggregationNode::new(String::new(), Vec::new(), measure_count)
    }

    fn new(name: String, path: Vec<String>, measure_count: usize) -> Self {
        AggregationNode {
            key: node_key(&path),
            name,
            depth: path.len(),
            path,
            aggregate: SmallVec::from_elem(0.0, measure_count),
            children: Vec::new(),
            child_index: FxHashMap::default(),
        }
    }

    pub fn children(&self) -> &[AggregationNode] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Looks up a direct child by its value.
    pub fn child(&self, name: &str) -> Option<&AggregationNode> {
        self.child_index.get(name).map(|&i| &self.children[i])
    }

    /// Follows `path` down from this node.
    pub fn descendant<S: AsRef<str>>(&self, path: &[S]) -> Option<&AggregationNode> {
        let mut node = self;
        for value in path {
            node = node.child(value.as_ref())?;
        }
        Some(node)
    }

    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }

    fn child_or_insert(&mut self, name: String, measure_count: usize) -> &mut AggregationNode {
        let idx = match self.child_index.get(&name) {
            Some(&i) => i,
            None => {
                let i = self.children.len();
                let mut path = self.path.clone();
                path.push(name.clone());
                self.children
                    .push(AggregationNode::new(name.clone(), path, measure_count));
                self.child_index.insert(name, i);
                i
            }
        };
        &mut self.children[idx]
    }

    fn accumulate(&mut self, values: &[f64]) {
        for (acc, v) in self.aggregate.iter_mut().zip(values) {
            *acc += v;
        }
    }
}

// ============================================================================
// TREE BUILDER
// ============================================================================

/// Folds rows into a rollup tree following `order.dimensions`, summing
/// `order.measures` at every level.
pub fn build_tree(rows: &[Row], order: &FieldOrder) -> AggregationNode {
    let measure_count = order.measures.len();
    let mut root = AggregationNode::root(measure_count);

    for row in rows {
        let values: Aggregate = order
            .measures
            .iter()
            .map(|&m| row.get(m).map(to_number).unwrap_or(0.0))
            .collect();

        let mut node = &mut root;
        for &dim in &order.dimensions {
            let value = row.get(dim).map(CellValue::display).unwrap_or_default();
            node = node.child_or_insert(value, measure_count);
            node.accumulate(&values);
        }
    }

    let mut total: Aggregate = SmallVec::from_elem(0.0, measure_count);
    for child in &root.children {
        for (acc, v) in total.iter_mut().zip(child.aggregate.iter()) {
            *acc += v;
        }
    }
    root.aggregate = total;

    root
}
