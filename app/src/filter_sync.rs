//! FILENAME: app/src/filter_sync.rs
//! PURPOSE: Drill-through. Turns a clicked hierarchy path into per-level
//! host filters, and clears them when the same path is clicked again.
//! CONTEXT: Host calls are issued strictly one after another; replace on
//! level i must commit before level i+1 is sent. Failures are caught per
//! field, logged, and returned in the `FilterOutcome`.

use serde::Serialize;

use pivot_engine::ordering::find_column_index;
use pivot_engine::text::normalize;
use pivot_engine::{ExpansionState, FieldIndex};

use crate::error::HostError;
use crate::host::{AnalyticsHost, FilterUpdateType};
use crate::{log_debug, log_enter, log_exit, log_info, log_warn};

// ============================================================================
// FIELD RESOLUTION
// ============================================================================

/// Maps every grouping dimension to the host field name its filter targets.
///
/// Per dimension: exact normalized match in `host_fields`, then containment
/// either way, then exact match among `host_dimension_fields`; otherwise the
/// column's own name is used as-is.
pub fn resolve_filter_fields<C, F, D>(
    dimension_order: &[FieldIndex],
    column_names: &[C],
    host_fields: &[F],
    host_dimension_fields: &[D],
) -> Vec<String>
where
    C: AsRef<str>,
    F: AsRef<str>,
    D: AsRef<str>,
{
    let host_norms: Vec<String> = host_fields.iter().map(|f| normalize(f.as_ref())).collect();
    let dim_norms: Vec<String> = host_dimension_fields
        .iter()
        .map(|f| normalize(f.as_ref()))
        .collect();

    dimension_order
        .iter()
        .filter_map(|&idx| column_names.get(idx).map(|c| c.as_ref()))
        .map(|name| {
            let target = normalize(name);
            if target.is_empty() {
                return name.to_string();
            }
            if let Some(pos) = find_column_index(&host_norms, &target) {
                return host_fields[pos].as_ref().to_string();
            }
            if let Some(pos) = dim_norms.iter().position(|n| *n == target) {
                return host_dimension_fields[pos].as_ref().to_string();
            }
            log_debug!("FILTER", "no host field for '{}', using column name", name);
            name.to_string()
        })
        .collect()
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FilterAction {
    Clear,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterFailure {
    pub field: String,
    pub action: FilterAction,
    pub message: String,
}

/// What one drill-through click did to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOutcome {
    /// Fields whose filter was cleared successfully.
    pub cleared: Vec<String>,
    /// Fields that received a replace filter successfully.
    pub applied: Vec<String>,
    pub failures: Vec<FilterFailure>,
    /// The click repeated the applied path and only cleared filters.
    pub toggled_off: bool,
}

impl FilterOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_failure(&mut self, field: &str, action: FilterAction, error: HostError) {
        log_warn!("FILTER", "{:?} failed field={} error={}", action, field, error);
        self.failures.push(FilterFailure {
            field: field.to_string(),
            action,
            message: error.to_string(),
        });
    }
}

// ============================================================================
// SYNCHRONIZER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FilterSynchronizer {
    /// Host field per dimension level, refreshed with every data pull.
    field_names: Vec<String>,
    applied_path: Option<Vec<String>>,
    preserve_expansion_once: bool,
}

impl FilterSynchronizer {
    pub fn new() -> Self {
        FilterSynchronizer::default()
    }

    pub fn set_field_names(&mut self, field_names: Vec<String>) {
        self.field_names = field_names;
    }

    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    pub fn applied_path(&self) -> Option<&[String]> {
        self.applied_path.as_deref()
    }

    /// Returns and resets the keep-expansion flag set by the last successful apply.
    pub fn take_preserve_flag(&mut self) -> bool {
        std::mem::take(&mut self.preserve_expansion_once)
    }

    /// Applies `path` as per-level replace filters, or clears every level if
    /// `path` is the path already applied.
    pub async fn apply_path<H>(
        &mut self,
        host: &H,
        path: &[String],
        expansion: &mut ExpansionState,
    ) -> FilterOutcome
    where
        H: AnalyticsHost + ?Sized,
    {
        log_enter!("FILTER", "apply_path", "path={:?} fields={:?}", path, self.field_names);
        let mut outcome = FilterOutcome::default();

        if self.applied_path.as_deref() == Some(path) {
            self.clear_all(host, &mut outcome).await;
            self.applied_path = None;
            outcome.toggled_off = true;
            log_info!("FILTER", "toggled off path={:?}", path);
            log_exit!("FILTER", "apply_path", "toggled_off");
            return outcome;
        }

        // Stale filters from a shorter or longer prior path go first.
        self.clear_all(host, &mut outcome).await;

        let mut apply_failed = false;
        for (level, value) in path.iter().enumerate() {
            let Some(field) = self.field_names.get(level) else {
                log_warn!(
                    "FILTER",
                    "no field resolved for level {} (value={}), skipped",
                    level,
                    value
                );
                continue;
            };

            match host
                .apply_filter(field, std::slice::from_ref(value), FilterUpdateType::Replace)
                .await
            {
                Ok(()) => outcome.applied.push(field.clone()),
                Err(e) => {
                    apply_failed = true;
                    outcome.record_failure(field, FilterAction::Apply, e);
                }
            }
        }

        if apply_failed {
            // Partial application is left in place; nothing is marked applied.
            self.applied_path = None;
        } else {
            self.applied_path = Some(path.to_vec());
            expansion.open_path(path);
            self.preserve_expansion_once = true;
        }

        log_exit!(
            "FILTER",
            "apply_path",
            "applied={} failures={}",
            outcome.applied.len(),
            outcome.failures.len()
        );
        outcome
    }

    async fn clear_all<H>(&self, host: &H, outcome: &mut FilterOutcome)
    where
        H: AnalyticsHost + ?Sized,
    {
        for field in &self.field_names {
            match host.clear_filter(field).await {
                Ok(()) => outcome.cleared.push(field.clone()),
                Err(e) => outcome.record_failure(field, FilterAction::Clear, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_then_containment() {
        let columns = ["Región", "Product", "SUM(Sales)"];
        let host = ["region", "Product Name", "Sales"];
        let fields = resolve_filter_fields(&[0, 1], &columns, &host, &[] as &[&str]);
        assert_eq!(fields, vec!["region", "Product Name"]);
    }

    #[test]
    fn test_resolve_dimension_list_then_column_name() {
        let columns = ["Segment", "Channel"];
        let host: [&str; 0] = [];
        let fields = resolve_filter_fields(&[0, 1], &columns, &host, &["SEGMENT"]);
        assert_eq!(fields, vec!["SEGMENT", "Channel"]);
    }

    #[test]
    fn test_resolve_follows_dimension_order() {
        let columns = ["Region", "Product"];
        let fields = resolve_filter_fields(&[1, 0], &columns, &columns, &columns);
        assert_eq!(fields, vec!["Product", "Region"]);
    }

    #[test]
    fn test_preserve_flag_is_one_shot() {
        let mut sync = FilterSynchronizer::new();
        sync.preserve_expansion_once = true;
        assert!(sync.take_preserve_flag());
        assert!(!sync.take_preserve_flag());
    }
}
