//! FILENAME: core/pivot-engine/src/lib.rs
//! Drill-through pivot tree engine.
//!
//! This crate turns a flat host table into a collapsible, sortable rollup
//! hierarchy. It is pure and synchronous: the `app` crate owns the host
//! round-trips and the state that survives refreshes.
//!
//! Layers:
//! - `definition`: Inputs (columns, rows, encoding order, view options)
//! - `classify` / `ordering`: Which columns group and which get summed, in what order
//! - `tree`: Rollup tree (HOW we aggregate)
//! - `expansion`: Which nodes are open
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Projection of the tree into the view (HOW we flatten)

pub mod definition;
pub mod text;
pub mod classify;
pub mod ordering;
pub mod tree;
pub mod expansion;
pub mod format;
pub mod view;
pub mod engine;

pub use definition::*;
pub use classify::{build_columns, classify_columns, ClassifierRules, ColumnPartition};
pub use ordering::{resolve_order, FieldOrder};
pub use tree::{build_tree, node_key, to_number, Aggregate, AggregationNode, KEY_SEPARATOR};
pub use expansion::ExpansionState;
pub use view::*;
pub use engine::{build_headers, measure_label, project_view, ViewProjector};
