//! FILENAME: app/src/settings.rs
//! PURPOSE: Persisted view preferences (page size, page, grand total, search).
//! CONTEXT: The host owns the key/value store; values arrive as strings and
//! are parsed leniently so a corrupt entry falls back to its default.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pivot_engine::{ViewOptions, DEFAULT_PAGE_SIZE};

use crate::error::HostError;
use crate::{log_debug, log_warn};

pub const KEY_PAGE_SIZE: &str = "pageSize";
pub const KEY_CURRENT_PAGE: &str = "currentPage";
pub const KEY_SHOW_GRAND_TOTAL: &str = "showGrandTotal";
pub const KEY_SEARCH: &str = "search";

/// Host-provided key/value settings store.
#[async_trait(?Send)]
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);

    /// Persists everything `set` so far.
    async fn save(&self) -> Result<(), HostError>;
}

/// In-memory store; `save` only counts calls.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RefCell<HashMap<String, String>>,
    saves: RefCell<usize>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        MemorySettingsStore::default()
    }

    pub fn with_values<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let store = MemorySettingsStore::new();
        {
            let mut values = store.values.borrow_mut();
            for (k, v) in pairs {
                values.insert(k.into(), v.into());
            }
        }
        store
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

#[async_trait(?Send)]
impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }

    async fn save(&self) -> Result<(), HostError> {
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}

// ============================================================================
// VIEW SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewSettings {
    pub page_size: usize,
    pub current_page: usize,
    pub show_grand_total: bool,
    pub search: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            page_size: DEFAULT_PAGE_SIZE,
            current_page: 1,
            show_grand_total: true,
            search: String::new(),
        }
    }
}

/// Positive integer or the fallback ("0", "abc", missing -> fallback).
fn parse_positive(raw: Option<String>, fallback: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n as usize)
        .unwrap_or(fallback)
}

impl ViewSettings {
    /// Reads settings from the store, defaulting anything missing or invalid.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let settings = ViewSettings {
            page_size: parse_positive(store.get(KEY_PAGE_SIZE), DEFAULT_PAGE_SIZE),
            current_page: parse_positive(store.get(KEY_CURRENT_PAGE), 1),
            show_grand_total: store.get(KEY_SHOW_GRAND_TOTAL).as_deref() != Some("false"),
            search: store.get(KEY_SEARCH).unwrap_or_default(),
        };
        log_debug!(
            "SETTINGS",
            "loaded page_size={} page={} grand_total={} search={:?}",
            settings.page_size,
            settings.current_page,
            settings.show_grand_total,
            settings.search
        );
        settings
    }

    /// Writes all keys and saves. A failed save is logged, not returned:
    /// the in-memory settings stay authoritative for this session.
    pub async fn save(&self, store: &dyn SettingsStore) {
        store.set(KEY_PAGE_SIZE, self.page_size.to_string());
        store.set(KEY_CURRENT_PAGE, self.current_page.to_string());
        store.set(KEY_SHOW_GRAND_TOTAL, self.show_grand_total.to_string());
        store.set(KEY_SEARCH, self.search.clone());

        if let Err(e) = store.save().await {
            log_warn!("SETTINGS", "save failed: {}", e);
        }
    }

    /// View options for the projector, combined with the live sort.
    pub fn to_view_options(&self, sort: pivot_engine::SortSpec) -> ViewOptions {
        ViewOptions {
            page_size: self.page_size.max(1),
            current_page: self.current_page.max(1),
            search: self.search.clone(),
            show_grand_total: self.show_grand_total,
            sort,
        }
    }
}
