//! Core engine for flagging overloaded kanban lists.
//! This crate owns the monitor lifecycle and the host page contract it runs on.

pub mod host;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod page;
pub mod settings;

pub use host::{
    HostPage, MutationCallback, MutationKind, MutationRecord, ObserveOptions, Selector,
    SelectorError, Subscription, SubscriptionId,
};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::capacity::{parse_card_count, parse_max_cards};
pub use model::ListSnapshot;
pub use monitor::{
    evaluate_list, BoardMonitor, ListEvaluation, ListMonitor, MonitorState, ReconcileReport,
    RootMonitor, SkipReason,
};
pub use page::{
    BoardFixture, DeliveryReport, Document, DocumentError, ListFixture, ListHandles,
    MountedBoard, NodeId, Page,
};
pub use settings::{MonitorSettings, SettingsDocument, SettingsError, SwitchStrategy};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
