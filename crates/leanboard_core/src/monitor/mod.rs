//! Layered monitors: root → board → list.
//!
//! # Responsibility
//! - Attach observers to the regions that currently exist on the page.
//! - Re-derive overload state whenever an observed region mutates.
//! - Tear down nested observers before replacing the structure they watch.
//!
//! # Invariants
//! - Every monitor is either `Inactive` or `Active`; each layer owns the
//!   layer below exclusively.
//! - An inactive monitor holds no subscription.
//! - Board switches release old list subscriptions before creating new ones.

pub mod board;
pub mod list;
pub mod root;

pub use board::{BoardMonitor, ReconcileReport};
pub use list::{evaluate_list, ListEvaluation, ListMonitor, SkipReason};
pub use root::RootMonitor;

/// Two-state lifecycle shared by every monitor layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Inactive,
    Active,
}

impl MonitorState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
        }
    }
}
