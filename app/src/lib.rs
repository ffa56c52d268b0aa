//! FILENAME: app/src/lib.rs
// PURPOSE: Main library entry point (analytics host bridge).
// CONTEXT: Wires the pure pivot engine to a host: data pulls, persisted view
// settings, drill-through filters and the single-threaded event loop.

pub mod logging;
pub mod error;
pub mod host;
pub mod settings;
pub mod events;
pub mod filter_sync;
pub mod session;

pub use error::{HostError, SessionError};
pub use events::{change_channel, drain_pending, ChangeNotifier, HostEvent, RefreshGate, SuspendGuard};
pub use filter_sync::{
    resolve_filter_fields, FilterAction, FilterFailure, FilterOutcome, FilterSynchronizer,
};
pub use host::{AnalyticsHost, FilterUpdateType, HostCell, HostColumn, SummaryTable};
pub use session::{PivotSession, SessionCommand};
pub use settings::{MemorySettingsStore, SettingsStore, ViewSettings};

pub use pivot_engine;
