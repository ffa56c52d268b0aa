//! FILENAME: core/pivot-engine/src/ordering.rs
//! Order Resolver - lines classified columns up with the host's encoding.
//!
//! The classifier yields dimensions and measures in table order, but the
//! user arranged fields in the host's visual layout. Every encoding entry
//! is matched back to a column by normalized name (exact first, then
//! bidirectional containment). Matched columns come first in encoding
//! order; the rest follow in classifier order.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::classify::ColumnPartition;
use crate::definition::{EncodingField, FieldIndex};
use crate::text::{contains_either, normalize};

/// Final grouping order (dimensions) and header order (measures).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder {
    pub dimensions: Vec<FieldIndex>,
    pub measures: Vec<FieldIndex>,
}

/// Finds the column whose normalized name matches `target`: exact match
/// first, otherwise the first column where either name contains the other.
pub fn find_column_index(column_norms: &[String], target: &str) -> Option<usize> {
    if let Some(pos) = column_norms.iter().position(|n| n == target) {
        return Some(pos);
    }
    column_norms.iter().position(|n| contains_either(n, target))
}

/// Reorders the partition to follow the encoding order where resolvable.
pub fn resolve_order<S: AsRef<str>>(
    column_names: &[S],
    partition: &ColumnPartition,
    encodings: &[EncodingField],
) -> FieldOrder {
    let norms: Vec<String> = column_names.iter().map(|c| normalize(c.as_ref())).collect();

    let mut seen_dims: FxHashSet<FieldIndex> = FxHashSet::default();
    let mut seen_meas: FxHashSet<FieldIndex> = FxHashSet::default();
    let mut order = FieldOrder::default();

    for encoding in encodings {
        let target = normalize(&encoding.field_name);
        // An empty name would "contain" into every column.
        if target.is_empty() {
            continue;
        }

        let Some(i) = find_column_index(&norms, &target) else {
            continue;
        };

        if partition.dimensions.contains(&i) && seen_dims.insert(i) {
            order.dimensions.push(i);
        }
        if partition.measures.contains(&i) && seen_meas.insert(i) {
            order.measures.push(i);
        }
    }

    order.dimensions.extend(
        partition
            .dimensions
            .iter()
            .copied()
            .filter(|i| !seen_dims.contains(i)),
    );
    order.measures.extend(
        partition
            .measures
            .iter()
            .copied()
            .filter(|i| !seen_meas.contains(i)),
    );

    order
}
