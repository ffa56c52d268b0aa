//! FILENAME: app/src/host.rs
//! PURPOSE: The analytics host as seen by the session.
//! CONTEXT: Everything the session reads (summary table, encoding) or
//! commands (filters) goes through `AnalyticsHost`. Calls are awaited one
//! at a time from a single execution context, hence `?Send`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pivot_engine::{CellValue, EncodingField, Row};

use crate::error::HostError;

// ============================================================================
// SUMMARY TABLE
// ============================================================================

/// Column descriptor as the host reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostColumn {
    pub field_name: Option<String>,
    pub name: Option<String>,
}

impl HostColumn {
    pub fn named(field_name: impl Into<String>) -> Self {
        HostColumn {
            field_name: Some(field_name.into()),
            name: None,
        }
    }

    /// Field name, else caption, else "col".
    pub fn display_name(&self) -> String {
        self.field_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.name.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or("col")
            .to_string()
    }
}

/// A single host cell: formatted text and/or raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCell {
    pub formatted_value: Option<String>,
    #[serde(default)]
    pub value: CellValue,
}

impl HostCell {
    pub fn text(s: impl Into<String>) -> Self {
        HostCell {
            formatted_value: Some(s.into()),
            value: CellValue::Empty,
        }
    }

    pub fn raw(value: CellValue) -> Self {
        HostCell {
            formatted_value: None,
            value,
        }
    }

    /// The formatted string wins when present; otherwise the raw value.
    pub fn to_cell_value(&self) -> CellValue {
        match self.formatted_value {
            Some(ref s) => CellValue::Text(s.clone()),
            None => self.value.clone(),
        }
    }
}

/// The host's summary data for the current worksheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub columns: Vec<HostColumn>,
    pub rows: Vec<Vec<HostCell>>,
}

impl SummaryTable {
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(HostColumn::display_name).collect()
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|r| r.iter().map(HostCell::to_cell_value).collect())
            .collect()
    }
}

// ============================================================================
// HOST INTERFACE
// ============================================================================

/// How an applied filter combines with what the host already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterUpdateType {
    Replace,
    Add,
    Remove,
    All,
}

#[async_trait(?Send)]
pub trait AnalyticsHost {
    /// Pulls the full summary table.
    async fn summary_data(&self) -> Result<SummaryTable, HostError>;

    /// Pulls the active visual encoding in layout order.
    async fn encoding_spec(&self) -> Result<Vec<EncodingField>, HostError>;

    /// Filters `field` to `values`.
    async fn apply_filter(
        &self,
        field: &str,
        values: &[String],
        update: FilterUpdateType,
    ) -> Result<(), HostError>;

    /// Removes any filter on `field`.
    async fn clear_filter(&self, field: &str) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_name_fallbacks() {
        assert_eq!(HostColumn::named("Region").display_name(), "Region");
        let caption = HostColumn {
            field_name: None,
            name: Some("Sales".to_string()),
        };
        assert_eq!(caption.display_name(), "Sales");
        assert_eq!(HostColumn::default().display_name(), "col");
    }

    #[test]
    fn test_formatted_value_preferred() {
        let cell = HostCell {
            formatted_value: Some("$1,200".to_string()),
            value: CellValue::Number(1200.0),
        };
        assert_eq!(cell.to_cell_value(), CellValue::Text("$1,200".to_string()));
        assert_eq!(
            HostCell::raw(CellValue::Number(3.0)).to_cell_value(),
            CellValue::Number(3.0)
        );
    }

    #[test]
    fn test_summary_table_deserializes_from_host_json() {
        let json = r#"{
            "columns": [{"fieldName": "Region"}, {"name": "SUM(Sales)"}],
            "rows": [[
                {"formattedValue": "East", "value": null},
                {"formattedValue": null, "value": 12.5}
            ]]
        }"#;
        let table: SummaryTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.column_names(), vec!["Region", "SUM(Sales)"]);
        assert_eq!(
            table.to_rows(),
            vec![vec![CellValue::from("East"), CellValue::Number(12.5)]]
        );
    }

    #[test]
    fn test_raw_values_accept_bare_json() {
        let cells: Vec<HostCell> = serde_json::from_str(
            r#"[{"value": 12.5}, {"value": "West"}, {"value": null}, {"formattedValue": "n/a"}]"#,
        )
        .unwrap();
        let values: Vec<CellValue> = cells.iter().map(HostCell::to_cell_value).collect();
        assert_eq!(
            values,
            vec![
                CellValue::Number(12.5),
                CellValue::Text("West".to_string()),
                CellValue::Empty,
                CellValue::Text("n/a".to_string()),
            ]
        );
        assert_eq!(
            serde_json::to_string(&HostCell::raw(CellValue::Number(3.0))).unwrap(),
            r#"{"formattedValue":null,"value":3.0}"#
        );
    }
}
