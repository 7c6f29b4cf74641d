//! Root monitor: the single active board of one page.
//!
//! # Responsibility
//! - Observe the content container and switch boards on every mutation batch.
//! - Own the active board monitor and its nested subscriptions.
//!
//! # Invariants
//! - At most one board monitor is active at any time.
//! - The old board is deactivated before the replacement is activated.
//! - `stop` releases the container subscription before the board.

use super::board::BoardMonitor;
use super::MonitorState;
use crate::host::{HostPage, MutationRecord, ObserveOptions, Subscription};
use crate::model::ListSnapshot;
use crate::settings::{MonitorSettings, SwitchStrategy};
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

struct ActiveBoard<P: HostPage> {
    board: Option<BoardMonitor<P>>,
    switches: u64,
}

/// Top-level controller for one page.
pub struct RootMonitor<P: HostPage> {
    container: P::Node,
    settings: Rc<MonitorSettings>,
    active: Rc<RefCell<ActiveBoard<P>>>,
    subscription: Option<Subscription>,
    state: MonitorState,
}

impl<P: HostPage> RootMonitor<P> {
    /// Creates a stopped monitor for an already located content container.
    pub fn new(container: P::Node, settings: Rc<MonitorSettings>) -> Self {
        Self {
            container,
            settings,
            active: Rc::new(RefCell::new(ActiveBoard {
                board: None,
                switches: 0,
            })),
            subscription: None,
            state: MonitorState::Inactive,
        }
    }

    /// Locates the content container with the configured selector.
    ///
    /// Returns `None` when the page has no such container.
    pub fn attach(page: &P, settings: Rc<MonitorSettings>) -> Option<Self> {
        let root = page.document_element();
        let Some(container) = page.query_selector(&root, &settings.content) else {
            debug!(
                "event=root_attach module=monitor status=skip reason=missing_container selector={}",
                settings.content
            );
            return None;
        };
        Some(Self::new(container, settings))
    }

    pub fn container(&self) -> &P::Node {
        &self.container
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == MonitorState::Active
    }

    /// Number of board switches run since construction.
    pub fn switch_count(&self) -> u64 {
        self.active.borrow().switches
    }

    /// Number of list monitors on the active board.
    pub fn list_count(&self) -> usize {
        self.active
            .borrow()
            .board
            .as_ref()
            .map_or(0, |board| board.lists().len())
    }

    /// Runs `inspect` against the active board, if any.
    pub fn with_board<T>(&self, inspect: impl FnOnce(Option<&BoardMonitor<P>>) -> T) -> T {
        inspect(self.active.borrow().board.as_ref())
    }

    /// Reports every list of the active board.
    pub fn snapshots(&self, page: &P) -> Vec<ListSnapshot> {
        self.with_board(|board| board.map(|board| board.snapshots(page)).unwrap_or_default())
    }

    /// Observes the container and performs the first board switch.
    ///
    /// Returns `false` when the monitor was already started.
    pub fn start(&mut self, page: &P) -> bool {
        if self.is_active() {
            warn!("event=root_start module=monitor status=skip reason=already_active");
            return false;
        }

        let container = self.container.clone();
        let settings = Rc::clone(&self.settings);
        let active = Rc::clone(&self.active);
        self.subscription = Some(page.observe(
            std::slice::from_ref(&self.container),
            ObserveOptions::ALL,
            Box::new(move |page: &P, records: &[MutationRecord<P::Node>]| {
                switch_board(page, &container, &settings, &active, records.len());
            }),
        ));
        self.state = MonitorState::Active;
        info!(
            "event=root_start module=monitor status=ok strategy={}",
            self.settings.switch_strategy.as_str()
        );

        switch_board(page, &self.container, &self.settings, &self.active, 0);
        true
    }

    /// Releases the container subscription, then the active board.
    ///
    /// Returns `false` when the monitor was not started.
    pub fn stop(&mut self) -> bool {
        if !self.is_active() {
            warn!("event=root_stop module=monitor status=skip reason=not_active");
            return false;
        }

        if let Some(subscription) = self.subscription.take() {
            subscription.disconnect();
        }
        let board = self.active.borrow_mut().board.take();
        let released = board.map_or(0, |mut board| board.deactivate());
        self.state = MonitorState::Inactive;

        info!("event=root_stop module=monitor status=ok lists_released={released}");
        true
    }
}

fn switch_board<P: HostPage>(
    page: &P,
    container: &P::Node,
    settings: &Rc<MonitorSettings>,
    active: &RefCell<ActiveBoard<P>>,
    records: usize,
) {
    let mut active = active.borrow_mut();
    active.switches += 1;
    let reconcile = settings.switch_strategy == SwitchStrategy::Reconcile;

    let lists = match active.board.as_mut() {
        Some(board) if reconcile => {
            board.reconcile(page);
            board.lists().len()
        }
        _ => {
            let released = active
                .board
                .take()
                .map_or(0, |mut board| board.deactivate());
            debug!("event=board_teardown module=monitor status=ok lists_released={released}");

            let mut board = BoardMonitor::new(container.clone(), Rc::clone(settings));
            let lists = board.activate(page);
            active.board = Some(board);
            lists
        }
    };

    info!(
        "event=board_switch module=monitor status=ok strategy={} switch={} records={} lists={}",
        settings.switch_strategy.as_str(),
        active.switches,
        records,
        lists
    );
}

#[cfg(test)]
mod tests {
    use super::RootMonitor;
    use crate::host::HostPage;
    use crate::monitor::MonitorState;
    use crate::page::{BoardFixture, ListFixture, Page};
    use crate::settings::MonitorSettings;
    use std::rc::Rc;

    #[test]
    fn attach_requires_content_container() {
        let page = Page::new();
        let settings = Rc::new(MonitorSettings::default());
        assert!(RootMonitor::attach(&page, settings).is_none());
    }

    #[test]
    fn start_switches_immediately_and_stop_releases_everything() {
        let (page, content) = Page::with_content_container().expect("scaffold");
        page.mount_board(
            content,
            &BoardFixture::new("Sprint", vec![ListFixture::new("Doing (max 1)", 2)]),
        )
        .expect("mount");
        page.run_until_idle();

        let mut root =
            RootMonitor::attach(&page, Rc::new(MonitorSettings::default())).expect("attach");
        assert_eq!(*root.container(), content);
        assert!(root.start(&page));
        assert!(!root.start(&page));
        assert_eq!(root.switch_count(), 1);
        assert_eq!(root.list_count(), 1);
        assert_eq!(page.observer_count(), 2);

        assert!(root.stop());
        assert_eq!(root.state(), MonitorState::Inactive);
        assert_eq!(page.observer_count(), 0);
        assert_eq!(root.list_count(), 0);
        assert!(!root.stop());
    }

    #[test]
    fn dropping_a_started_root_releases_observers() {
        let (page, content) = Page::with_content_container().expect("scaffold");
        page.mount_board(
            content,
            &BoardFixture::new("Sprint", vec![ListFixture::new("Doing (max 1)", 0)]),
        )
        .expect("mount");

        {
            let mut root = RootMonitor::<Page>::new(content, Rc::new(MonitorSettings::default()));
            root.start(&page);
            assert_eq!(page.observer_count(), 2);
        }
        assert_eq!(page.observer_count(), 0);
        assert_eq!(page.document_element(), page.document().root());
    }
}
