//! FILENAME: app/tests/common/mod.rs
//! Test harness and fixtures for drill-through session integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use app_lib::pivot_engine::{CellValue, EncodingField};
use app_lib::{
    AnalyticsHost, ChangeNotifier, FilterUpdateType, HostCell, HostColumn, HostError,
    MemorySettingsStore, PivotSession, SummaryTable,
};
use async_trait::async_trait;

/// Every call the session made against the host, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Summary,
    Encoding,
    Apply(String, String),
    Clear(String),
}

/// In-memory analytics host. Applied filters narrow the summary table it
/// returns, the way a real worksheet would.
pub struct MockHost {
    table: RefCell<SummaryTable>,
    encoding: RefCell<Vec<EncodingField>>,
    filters: RefCell<HashMap<String, String>>,
    calls: RefCell<Vec<HostCall>>,

    failing_applies: RefCell<HashSet<String>>,
    failing_clears: RefCell<HashSet<String>>,
    fail_reads: Cell<bool>,

    /// Fires DataChanged after each filter command when attached.
    notifier: RefCell<Option<ChangeNotifier>>,
    notifications_sent: Cell<usize>,
}

impl MockHost {
    pub fn new(table: SummaryTable, encoding: Vec<EncodingField>) -> Self {
        MockHost {
            table: RefCell::new(table),
            encoding: RefCell::new(encoding),
            filters: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            failing_applies: RefCell::new(HashSet::new()),
            failing_clears: RefCell::new(HashSet::new()),
            fail_reads: Cell::new(false),
            notifier: RefCell::new(None),
            notifications_sent: Cell::new(0),
        }
    }

    /// Region / Product / SUM(Sales), three rows, total 250.
    pub fn sales() -> Self {
        MockHost::new(sales_table(), sales_encoding())
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    /// Filter commands only (reads dropped).
    pub fn filter_calls(&self) -> Vec<HostCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, HostCall::Apply(..) | HostCall::Clear(_)))
            .cloned()
            .collect()
    }

    pub fn summary_reads(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| **c == HostCall::Summary)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn active_filters(&self) -> HashMap<String, String> {
        self.filters.borrow().clone()
    }

    pub fn notifications_sent(&self) -> usize {
        self.notifications_sent.get()
    }

    // ========================================================================
    // SCENARIO SETUP
    // ========================================================================

    pub fn fail_apply_on(&self, field: &str) {
        self.failing_applies.borrow_mut().insert(field.to_string());
    }

    pub fn fail_clear_on(&self, field: &str) {
        self.failing_clears.borrow_mut().insert(field.to_string());
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    pub fn set_table(&self, table: SummaryTable) {
        *self.table.borrow_mut() = table;
    }

    pub fn set_encoding(&self, encoding: Vec<EncodingField>) {
        *self.encoding.borrow_mut() = encoding;
    }

    pub fn attach_notifier(&self, notifier: ChangeNotifier) {
        *self.notifier.borrow_mut() = Some(notifier);
    }

    fn fire_change(&self) {
        if let Some(ref notifier) = *self.notifier.borrow() {
            if notifier.notify() {
                self.notifications_sent.set(self.notifications_sent.get() + 1);
            }
        }
    }

    fn filtered_table(&self) -> SummaryTable {
        let table = self.table.borrow();
        let filters = self.filters.borrow();
        let names = table.column_names();

        let rows = table
            .rows
            .iter()
            .filter(|row| {
                filters.iter().all(|(field, value)| {
                    match names.iter().position(|n| n == field) {
                        Some(col) => row
                            .get(col)
                            .map_or(false, |cell| cell.to_cell_value().display() == *value),
                        None => true,
                    }
                })
            })
            .cloned()
            .collect();

        SummaryTable {
            columns: table.columns.clone(),
            rows,
        }
    }
}

#[async_trait(?Send)]
impl AnalyticsHost for MockHost {
    async fn summary_data(&self) -> Result<SummaryTable, HostError> {
        self.calls.borrow_mut().push(HostCall::Summary);
        if self.fail_reads.get() {
            return Err(HostError::Read("summary unavailable".to_string()));
        }
        Ok(self.filtered_table())
    }

    async fn encoding_spec(&self) -> Result<Vec<EncodingField>, HostError> {
        self.calls.borrow_mut().push(HostCall::Encoding);
        if self.fail_reads.get() {
            return Err(HostError::Read("encoding unavailable".to_string()));
        }
        Ok(self.encoding.borrow().clone())
    }

    async fn apply_filter(
        &self,
        field: &str,
        values: &[String],
        update: FilterUpdateType,
    ) -> Result<(), HostError> {
        let value = values.first().cloned().unwrap_or_default();
        self.calls
            .borrow_mut()
            .push(HostCall::Apply(field.to_string(), value.clone()));
        assert_eq!(update, FilterUpdateType::Replace);

        if self.failing_applies.borrow().contains(field) {
            return Err(HostError::filter(field, "rejected by host"));
        }
        self.filters.borrow_mut().insert(field.to_string(), value);
        self.fire_change();
        Ok(())
    }

    async fn clear_filter(&self, field: &str) -> Result<(), HostError> {
        self.calls.borrow_mut().push(HostCall::Clear(field.to_string()));
        if self.failing_clears.borrow().contains(field) {
            return Err(HostError::filter(field, "clear rejected"));
        }
        self.filters.borrow_mut().remove(field);
        self.fire_change();
        Ok(())
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub fn table(columns: &[&str], rows: &[&[&str]]) -> SummaryTable {
    SummaryTable {
        columns: columns.iter().map(|c| HostColumn::named(*c)).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|v| HostCell::text(*v)).collect())
            .collect(),
    }
}

pub fn sales_table() -> SummaryTable {
    table(
        &["Region", "Product", "SUM(Sales)"],
        &[
            &["East", "Chairs", "120"],
            &["East", "Tables", "80"],
            &["West", "Chairs", "50"],
        ],
    )
}

pub fn sales_encoding() -> Vec<EncodingField> {
    vec![
        EncodingField::new("Region", "dimension"),
        EncodingField::new("Product", "dimension"),
        EncodingField::new("SUM(Sales)", "measure"),
    ]
}

/// `count` regions named R00.., one product each, with raw numeric sales.
pub fn many_regions(count: usize) -> SummaryTable {
    SummaryTable {
        columns: vec![
            HostColumn::named("Region"),
            HostColumn::named("Product"),
            HostColumn::named("SUM(Sales)"),
        ],
        rows: (0..count)
            .map(|i| {
                vec![
                    HostCell::text(format!("R{:02}", i)),
                    HostCell::text("Widget"),
                    HostCell::raw(CellValue::Number((i + 1) as f64)),
                ]
            })
            .collect(),
    }
}

pub fn path(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub type TestSession = PivotSession<MockHost, MemorySettingsStore>;

/// Session over `host` with an empty settings store, initialized.
pub async fn init_session(host: MockHost) -> TestSession {
    let mut session = PivotSession::new(host, MemorySettingsStore::new());
    session.init().await.unwrap();
    session
}
