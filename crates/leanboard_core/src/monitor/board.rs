//! Board monitor: the set of list monitors for one board.
//!
//! # Responsibility
//! - Create one list monitor per list region, in document order.
//! - Release every list monitor on deactivation.
//! - Optionally reconcile against the current list regions.
//!
//! # Invariants
//! - List insertion/removal is not observed here; the root triggers rescans.
//! - Reconcile releases vanished monitors before activating new ones.

use super::list::ListMonitor;
use super::MonitorState;
use crate::host::HostPage;
use crate::model::ListSnapshot;
use crate::settings::MonitorSettings;
use log::{debug, warn};
use std::rc::Rc;

/// Counters from one `BoardMonitor::reconcile` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

/// Monitor for every list region under one scope.
pub struct BoardMonitor<P: HostPage> {
    scope: P::Node,
    settings: Rc<MonitorSettings>,
    lists: Vec<ListMonitor<P>>,
    state: MonitorState,
}

impl<P: HostPage> BoardMonitor<P> {
    pub fn new(scope: P::Node, settings: Rc<MonitorSettings>) -> Self {
        Self {
            scope,
            settings,
            lists: Vec::new(),
            state: MonitorState::Inactive,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == MonitorState::Active
    }

    pub fn lists(&self) -> &[ListMonitor<P>] {
        &self.lists
    }

    /// Creates and activates one list monitor per region.
    ///
    /// Returns the number of lists activated; `0` when already active.
    pub fn activate(&mut self, page: &P) -> usize {
        if self.is_active() {
            warn!("event=board_activate module=monitor status=skip reason=already_active");
            return 0;
        }

        self.lists = page
            .query_selector_all(&self.scope, &self.settings.list)
            .into_iter()
            .map(|region| ListMonitor::new(region, Rc::clone(&self.settings)))
            .collect();
        for list in &mut self.lists {
            list.activate(page);
        }
        self.state = MonitorState::Active;

        debug!(
            "event=board_activate module=monitor status=ok lists={}",
            self.lists.len()
        );
        self.lists.len()
    }

    /// Deactivates every list monitor and clears the collection.
    ///
    /// Returns the number of lists released.
    pub fn deactivate(&mut self) -> usize {
        if !self.is_active() {
            warn!("event=board_deactivate module=monitor status=skip reason=not_active");
            return 0;
        }

        let released = self.lists.len();
        for list in &mut self.lists {
            list.deactivate();
        }
        self.lists.clear();
        self.state = MonitorState::Inactive;

        debug!("event=board_deactivate module=monitor status=ok lists={released}");
        released
    }

    /// Aligns list monitors with the regions currently on the page.
    ///
    /// Monitors whose region is still present keep their subscription and are
    /// not re-evaluated. An inactive board is simply activated.
    pub fn reconcile(&mut self, page: &P) -> ReconcileReport {
        if !self.is_active() {
            let added = self.activate(page);
            return ReconcileReport {
                added,
                ..ReconcileReport::default()
            };
        }

        let regions = page.query_selector_all(&self.scope, &self.settings.list);
        let mut report = ReconcileReport::default();

        let mut survivors = Vec::with_capacity(self.lists.len());
        for mut list in self.lists.drain(..) {
            if regions.contains(list.region()) {
                survivors.push(Some(list));
            } else {
                list.deactivate();
                report.removed += 1;
            }
        }

        let mut next = Vec::with_capacity(regions.len());
        for region in regions {
            let existing = survivors
                .iter_mut()
                .find(|slot| matches!(slot, Some(list) if *list.region() == region))
                .and_then(Option::take);
            match existing {
                Some(list) => {
                    report.kept += 1;
                    next.push(list);
                }
                None => {
                    let mut list = ListMonitor::new(region, Rc::clone(&self.settings));
                    list.activate(page);
                    report.added += 1;
                    next.push(list);
                }
            }
        }
        self.lists = next;

        debug!(
            "event=board_reconcile module=monitor status=ok added={} removed={} kept={}",
            report.added, report.removed, report.kept
        );
        report
    }

    /// Reports every monitored list in document order.
    pub fn snapshots(&self, page: &P) -> Vec<ListSnapshot> {
        self.lists.iter().map(|list| list.snapshot(page)).collect()
    }
}
