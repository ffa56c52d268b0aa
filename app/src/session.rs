//! FILENAME: app/src/session.rs
//! PURPOSE: The drill-through session: one explicit context that owns the
//! host handle, persisted settings and the state that survives a refresh.
//! CONTEXT: Each refresh replaces columns, rows, tree and headers wholesale.
//! Only expansion, the applied filter path, sort and settings carry over.
//! Everything runs on one execution context; see `run`.

use std::time::Instant;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pivot_engine::{
    build_columns, build_headers, build_tree, classify_columns, project_view, resolve_order,
    AggregationNode, ClassifierRules, Column, ExpansionState, FieldOrder, PivotView, Row,
    SortSpec, KEY_SEPARATOR,
};

use crate::error::SessionError;
use crate::events::{drain_pending, ChangeNotifier, HostEvent, RefreshGate};
use crate::filter_sync::{resolve_filter_fields, FilterOutcome, FilterSynchronizer};
use crate::host::AnalyticsHost;
use crate::settings::{SettingsStore, ViewSettings};
use crate::{log_debug, log_enter, log_error, log_exit, log_info, log_perf, log_warn};

/// User input delivered to `PivotSession::run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Refresh,
    ClickHeader(usize),
    ToggleNode(String),
    SetSearch(String),
    SetPageSize(usize),
    NextPage,
    PrevPage,
    SetShowGrandTotal(bool),
    ClickRow(Vec<String>),
}

pub struct PivotSession<H, S> {
    host: H,
    store: S,
    rules: ClassifierRules,

    settings: ViewSettings,
    sort: SortSpec,
    expansion: ExpansionState,
    synchronizer: FilterSynchronizer,

    // Rebuilt by every refresh
    columns: Vec<Column>,
    rows: Vec<Row>,
    order: FieldOrder,
    headers: Vec<String>,
    tree: Option<AggregationNode>,
    refreshed_at: Option<DateTime<Local>>,

    last_filter: Option<FilterOutcome>,

    gate: RefreshGate,
    notifier: ChangeNotifier,
    events: mpsc::UnboundedReceiver<HostEvent>,
}

impl<H, S> PivotSession<H, S>
where
    H: AnalyticsHost,
    S: SettingsStore,
{
    pub fn new(host: H, store: S) -> Self {
        PivotSession::with_rules(host, store, ClassifierRules::default())
    }

    /// Like `new`, with custom column classification rules.
    pub fn with_rules(host: H, store: S, rules: ClassifierRules) -> Self {
        let gate = RefreshGate::new();
        let (notifier, events) = crate::events::change_channel(gate.clone());
        PivotSession {
            host,
            store,
            rules,
            settings: ViewSettings::default(),
            sort: SortSpec::unsorted(),
            expansion: ExpansionState::new(),
            synchronizer: FilterSynchronizer::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            order: FieldOrder::default(),
            headers: Vec::new(),
            tree: None,
            refreshed_at: None,
            last_filter: None,
            gate,
            notifier,
            events,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle the host uses to signal `DataChanged`.
    pub fn notifier(&self) -> ChangeNotifier {
        self.notifier.clone()
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn order(&self) -> &FieldOrder {
        &self.order
    }

    pub fn tree(&self) -> Option<&AggregationNode> {
        self.tree.as_ref()
    }

    pub fn filter_fields(&self) -> &[String] {
        self.synchronizer.field_names()
    }

    pub fn applied_path(&self) -> Option<&[String]> {
        self.synchronizer.applied_path()
    }

    pub fn last_filter_outcome(&self) -> Option<&FilterOutcome> {
        self.last_filter.as_ref()
    }

    /// Local time of the last successful refresh.
    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Loads persisted settings and performs the first refresh.
    pub async fn init(&mut self) -> Result<(), SessionError> {
        self.settings = ViewSettings::load(&self.store);
        self.refresh().await
    }

    /// Pulls the summary table and encoding, then rebuilds everything.
    /// On a host read failure the previous state stays in place.
    pub async fn refresh(&mut self) -> Result<(), SessionError> {
        log_enter!("REFRESH", "refresh");
        let started = Instant::now();

        let table = self.host.summary_data().await.map_err(|e| {
            log_error!("REFRESH", "summary read failed: {}", e);
            e
        })?;
        let encodings = self.host.encoding_spec().await.map_err(|e| {
            log_error!("REFRESH", "encoding read failed: {}", e);
            e
        })?;

        let column_names = table.column_names();
        let rows = table.to_rows();

        let partition = classify_columns(&column_names, &self.rules);
        let order = resolve_order(&column_names, &partition, &encodings);
        let tree = build_tree(&rows, &order);
        let headers = build_headers(&column_names, &order.measures);

        let dimension_fields: Vec<&str> = partition
            .dimensions
            .iter()
            .filter_map(|&i| column_names.get(i).map(String::as_str))
            .collect();
        let field_names =
            resolve_filter_fields(&order.dimensions, &column_names, &column_names, &dimension_fields);
        log_debug!("REFRESH", "filter fields {:?}", field_names);

        if self.synchronizer.take_preserve_flag() {
            log_debug!("REFRESH", "keeping {} expanded node(s)", self.expansion.len());
        } else {
            self.expansion.clear();
        }
        self.synchronizer.set_field_names(field_names);

        self.columns = build_columns(&column_names, &partition);
        self.rows = rows;
        self.order = order;
        self.headers = headers;
        self.tree = Some(tree);
        self.refreshed_at = Some(Local::now());
        self.clamp_current_page().await;

        log_perf!(
            "REFRESH",
            "rows={} cols={} dims={} measures={} elapsed={:?}",
            self.rows.len(),
            self.columns.len(),
            self.order.dimensions.len(),
            self.order.measures.len(),
            started.elapsed()
        );
        log_exit!("REFRESH", "refresh");
        Ok(())
    }

    /// Projects the current tree under the current settings.
    pub fn view(&self) -> Result<PivotView, SessionError> {
        let tree = self.tree.as_ref().ok_or(SessionError::NotInitialized)?;
        let options = self.settings.to_view_options(self.sort);
        Ok(project_view(
            tree,
            self.headers.clone(),
            &options,
            &self.expansion,
            self.synchronizer.applied_path(),
        ))
    }

    // ========================================================================
    // USER ACTIONS
    // ========================================================================

    /// Sorts top-level groups by header `index` (flips on repeat).
    pub fn click_header(&mut self, index: usize) {
        if index >= self.headers.len() {
            log_warn!("SESSION", "click_header: no header at {}", index);
            return;
        }
        self.sort.click(index);
        log_debug!("SESSION", "sort {:?}", self.sort);
    }

    /// Opens or closes a group row. Leaves and unknown keys are ignored.
    /// Returns whether the node is open afterwards.
    pub fn toggle_node(&mut self, key: &str) -> bool {
        let path: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        let expandable = self
            .tree
            .as_ref()
            .and_then(|t| t.descendant(&path))
            .map_or(false, AggregationNode::has_children);

        if !expandable {
            log_debug!("SESSION", "toggle_node ignored for {:?}", key);
            return self.expansion.is_open(key);
        }
        self.expansion.toggle(key)
    }

    pub async fn set_search(&mut self, text: &str) {
        self.settings.search = text.to_string();
        self.settings.current_page = 1;
        self.settings.save(&self.store).await;
    }

    pub async fn set_page_size(&mut self, page_size: usize) {
        self.settings.page_size = page_size.max(1);
        self.settings.current_page = 1;
        self.settings.save(&self.store).await;
    }

    pub async fn set_show_grand_total(&mut self, on: bool) {
        self.settings.show_grand_total = on;
        self.settings.save(&self.store).await;
    }

    fn total_pages(&self) -> usize {
        let top_level = self.tree.as_ref().map_or(0, |t| t.children().len());
        top_level.div_ceil(self.settings.page_size.max(1))
    }

    /// Pulls the current page back inside the rebuilt tree (a drill-through
    /// usually narrows the host data to a single group).
    async fn clamp_current_page(&mut self) {
        let last_page = self.total_pages().max(1);
        if self.settings.current_page <= last_page {
            return;
        }
        log_debug!(
            "REFRESH",
            "page {} past the end, moving to {}",
            self.settings.current_page,
            last_page
        );
        self.settings.current_page = last_page;
        self.settings.save(&self.store).await;
    }

    /// Returns false at the last page.
    pub async fn next_page(&mut self) -> bool {
        if self.settings.current_page >= self.total_pages() {
            return false;
        }
        self.settings.current_page += 1;
        self.expansion.clear();
        self.settings.save(&self.store).await;
        true
    }

    /// Returns false at the first page.
    pub async fn prev_page(&mut self) -> bool {
        if self.settings.current_page <= 1 {
            return false;
        }
        self.settings.current_page -= 1;
        self.expansion.clear();
        self.settings.save(&self.store).await;
        true
    }

    /// Drill-through on a group row's path (the total row's empty path is
    /// inert). Host refreshes are suppressed while the filter sequence
    /// runs; afterwards queued change events are collapsed and exactly one
    /// refresh is forced, whatever the individual filter steps returned.
    pub async fn click_row(&mut self, path: &[String]) -> Result<Option<FilterOutcome>, SessionError> {
        if path.is_empty() {
            return Ok(None);
        }

        let Some(guard) = self.gate.try_suspend() else {
            log_warn!("SESSION", "click_row ignored: filter sequence already in flight");
            return Ok(None);
        };

        let outcome = self
            .synchronizer
            .apply_path(&self.host, path, &mut self.expansion)
            .await;
        drop(guard);

        if !outcome.is_success() {
            log_warn!(
                "SESSION",
                "drill-through finished with {} failure(s)",
                outcome.failures.len()
            );
        }
        self.last_filter = Some(outcome.clone());

        drain_pending(&mut self.events);
        self.refresh().await?;
        Ok(Some(outcome))
    }

    /// Host data changed. Ignored while a filter sequence is in flight;
    /// returns whether a refresh ran.
    pub async fn handle_data_changed(&mut self) -> Result<bool, SessionError> {
        if self.gate.is_suspended() {
            log_debug!("SESSION", "DataChanged ignored while suspended");
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Executes one user command.
    pub async fn dispatch(&mut self, command: SessionCommand) -> Result<(), SessionError> {
        log_debug!("SESSION", "dispatch {:?}", command);
        match command {
            SessionCommand::Refresh => self.refresh().await?,
            SessionCommand::ClickHeader(index) => self.click_header(index),
            SessionCommand::ToggleNode(key) => {
                self.toggle_node(&key);
            }
            SessionCommand::SetSearch(text) => self.set_search(&text).await,
            SessionCommand::SetPageSize(size) => self.set_page_size(size).await,
            SessionCommand::NextPage => {
                self.next_page().await;
            }
            SessionCommand::PrevPage => {
                self.prev_page().await;
            }
            SessionCommand::SetShowGrandTotal(on) => self.set_show_grand_total(on).await,
            SessionCommand::ClickRow(path) => {
                self.click_row(&path).await?;
            }
        }
        Ok(())
    }

    /// Event loop: host change events and user commands, one at a time,
    /// until `cancel` fires or the command channel closes. Pending host
    /// events are handled before the next command. Errors are logged and
    /// the loop keeps going.
    pub async fn run(
        &mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        cancel: CancellationToken,
    ) {
        log_info!("SESSION", "event loop started");

        enum Next {
            Command(SessionCommand),
            DataChanged,
            Stop,
        }

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Next::Stop,
                Some(_) = self.events.recv() => Next::DataChanged,
                command = commands.recv() => match command {
                    Some(command) => Next::Command(command),
                    None => Next::Stop,
                },
            };

            let result = match next {
                Next::Stop => break,
                Next::Command(command) => self.dispatch(command).await,
                Next::DataChanged => self.handle_data_changed().await.map(|_| ()),
            };
            if let Err(e) = result {
                log_error!("SESSION", "{}", e);
            }
        }

        log_info!("SESSION", "event loop stopped");
    }
}
