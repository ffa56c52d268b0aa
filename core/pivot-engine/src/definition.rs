//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The inputs the engine is driven by.
//!
//! This module contains the types that DESCRIBE one refresh cycle:
//! - The host's columns and rows (rebuilt from scratch every refresh)
//! - The host's field encoding order
//! - The user's view intent (sort, paging, search, grand total)
//!
//! None of these are mutated by the engine; the session replaces them
//! wholesale when the host sends fresh data.

use serde::{Deserialize, Serialize};

/// Index into the source columns (0-based).
pub type FieldIndex = usize;

/// Default number of top-level groups per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered to the user.
pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 20, 50];

// ============================================================================
// CELL VALUES
// ============================================================================

/// A single cell as the engine sees it.
/// Hosts that supply a formatted string hand it over as `Text`; raw numbers
/// without formatting stay `Number`. Serialized as a bare JSON value:
/// `null`, a number or a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Display string, used as the grouping key for dimension cells.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => format!("{}", n),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One host row, aligned to the column list.
pub type Row = Vec<CellValue>;

// ============================================================================
// COLUMNS
// ============================================================================

/// Whether a column groups rows or gets summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Dimension,
    Measure,
}

/// A classified source column. Roles are assigned once per refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub index: FieldIndex,
    pub name: String,
    pub role: ColumnRole,
}

// ============================================================================
// ENCODING
// ============================================================================

/// One entry of the host's visual encoding, in the order the user laid
/// the fields out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingField {
    /// Field name as the host reports it (e.g. "SUM(Sales)").
    pub field_name: String,

    /// Channel the host placed the field on ("rows", "color", ...).
    /// Informational only; ordering is resolved by name.
    pub role: String,
}

impl EncodingField {
    pub fn new(field_name: impl Into<String>, role: impl Into<String>) -> Self {
        EncodingField {
            field_name: field_name.into(),
            role: role.into(),
        }
    }
}

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// What the top-level groups are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Tree insertion order (first-seen).
    Unsorted,
    /// Node name.
    Name,
    /// Aggregate of the measure at this position in the measure order.
    Measure(usize),
}

/// Sort selection, addressed by header index: `None` is unsorted, `0` is
/// the hierarchy column, `k > 0` is measure `k - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: Option<usize>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn unsorted() -> Self {
        SortSpec::default()
    }

    pub fn by(column: usize, direction: SortDirection) -> Self {
        SortSpec {
            column: Some(column),
            direction,
        }
    }

    pub fn key(&self) -> SortKey {
        match self.column {
            None => SortKey::Unsorted,
            Some(0) => SortKey::Name,
            Some(k) => SortKey::Measure(k - 1),
        }
    }

    /// Header click: the same column flips direction, a new column starts
    /// ascending.
    pub fn click(&mut self, header_index: usize) {
        if self.column == Some(header_index) {
            self.direction = self.direction.flipped();
        } else {
            self.column = Some(header_index);
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn is_sorted_on(&self, header_index: usize) -> bool {
        self.column == Some(header_index)
    }
}

// ============================================================================
// VIEW OPTIONS
// ============================================================================

/// Everything the projector needs besides the tree and expansion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    /// Top-level groups per page (>= 1).
    pub page_size: usize,

    /// 1-based page number.
    pub current_page: usize,

    /// Free-text search over node names. Blank means no search.
    pub search: String,

    /// Emit the synthetic grand total row first.
    pub show_grand_total: bool,

    pub sort: SortSpec,
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
            search: String::new(),
            show_grand_total: true,
            sort: SortSpec::unsorted(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_click_same_column_flips() {
        let mut sort = SortSpec::unsorted();
        sort.click(1);
        assert_eq!(sort, SortSpec::by(1, SortDirection::Ascending));
        sort.click(1);
        assert_eq!(sort, SortSpec::by(1, SortDirection::Descending));
        sort.click(1);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_sort_click_other_column_resets_to_ascending() {
        let mut sort = SortSpec::by(2, SortDirection::Descending);
        sort.click(0);
        assert_eq!(sort, SortSpec::by(0, SortDirection::Ascending));
    }

    #[test]
    fn test_sort_key_mapping() {
        assert_eq!(SortSpec::unsorted().key(), SortKey::Unsorted);
        assert_eq!(SortSpec::by(0, SortDirection::Ascending).key(), SortKey::Name);
        assert_eq!(SortSpec::by(3, SortDirection::Ascending).key(), SortKey::Measure(2));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Empty.display(), "");
        assert_eq!(CellValue::Number(120.0).display(), "120");
        assert_eq!(CellValue::Number(1.5).display(), "1.5");
        assert_eq!(CellValue::from("East").display(), "East");
    }
}
