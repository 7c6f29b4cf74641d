//! List monitor: one region, one subscription.
//!
//! # Responsibility
//! - Observe a list's heading and counter.
//! - Toggle the overloaded marker on the region when both numbers are known.
//!
//! # Invariants
//! - Without a parsable limit or count the marker is left as it was.
//! - After `deactivate` the monitor never evaluates again.

use super::MonitorState;
use crate::host::{HostPage, MutationRecord, ObserveOptions, Subscription, SubscriptionId};
use crate::model::capacity::{parse_card_count, parse_max_cards};
use crate::model::class_tokens::{has_class, toggle_class};
use crate::model::ListSnapshot;
use crate::settings::MonitorSettings;
use log::{debug, trace, warn};
use std::cell::Cell;
use std::rc::Rc;

/// Why an evaluation left the marker untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Heading missing or without a `(max N)` annotation.
    MissingCapacity,
    /// Counter missing or without leading digits.
    MissingCount,
}

/// Outcome of one list evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvaluation {
    Skipped(SkipReason),
    Applied {
        card_count: i64,
        max_capacity: i64,
        overloaded: bool,
        /// Whether the class attribute was rewritten.
        changed: bool,
    },
}

/// Derives overload state for `region` and writes the marker.
pub fn evaluate_list<P: HostPage>(
    page: &P,
    region: &P::Node,
    settings: &MonitorSettings,
) -> ListEvaluation {
    let max_capacity = page
        .query_selector(region, &settings.heading)
        .and_then(|heading| parse_max_cards(&page.text_content(&heading)));
    let Some(max_capacity) = max_capacity else {
        return ListEvaluation::Skipped(SkipReason::MissingCapacity);
    };

    let card_count = page
        .query_selector(region, &settings.counter)
        .and_then(|counter| parse_card_count(&page.text_content(&counter)));
    let Some(card_count) = card_count else {
        return ListEvaluation::Skipped(SkipReason::MissingCount);
    };
    let overloaded = card_count > max_capacity;

    let class_name = page.class_name(region);
    let rewritten = toggle_class(&class_name, &settings.overloaded_class, overloaded);
    let changed = rewritten.is_some();
    if let Some(value) = rewritten {
        page.set_class_name(region, &value);
    }

    ListEvaluation::Applied {
        card_count,
        max_capacity,
        overloaded,
        changed,
    }
}

/// Monitor for one list region.
pub struct ListMonitor<P: HostPage> {
    region: P::Node,
    settings: Rc<MonitorSettings>,
    subscription: Option<Subscription>,
    state: MonitorState,
    evaluations: Rc<Cell<u64>>,
}

impl<P: HostPage> ListMonitor<P> {
    pub fn new(region: P::Node, settings: Rc<MonitorSettings>) -> Self {
        Self {
            region,
            settings,
            subscription: None,
            state: MonitorState::Inactive,
            evaluations: Rc::new(Cell::new(0)),
        }
    }

    pub fn region(&self) -> &P::Node {
        &self.region
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == MonitorState::Active
    }

    /// Id of the live subscription, if heading or counter could be observed.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(Subscription::id)
    }

    /// Number of evaluations run since construction.
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations.get()
    }

    /// Starts observing and evaluates once synchronously.
    ///
    /// Returns `None` when the monitor was already active.
    pub fn activate(&mut self, page: &P) -> Option<ListEvaluation> {
        if self.is_active() {
            warn!("event=list_activate module=monitor status=skip reason=already_active");
            return None;
        }

        let targets = [&self.settings.heading, &self.settings.counter]
            .into_iter()
            .filter_map(|selector| page.query_selector(&self.region, selector))
            .collect::<Vec<_>>();

        if targets.is_empty() {
            debug!("event=list_activate module=monitor status=skip reason=no_targets");
        } else {
            let region = self.region.clone();
            let settings = Rc::clone(&self.settings);
            let evaluations = Rc::clone(&self.evaluations);
            let subscription = page.observe(
                &targets,
                ObserveOptions::ALL,
                Box::new(move |page: &P, records: &[MutationRecord<P::Node>]| {
                    evaluations.set(evaluations.get() + 1);
                    let outcome = evaluate_list(page, &region, &settings);
                    trace!(
                        "event=list_eval module=monitor status=ok trigger=mutation records={} outcome={:?}",
                        records.len(),
                        outcome
                    );
                }),
            );
            self.subscription = Some(subscription);
        }
        self.state = MonitorState::Active;

        self.evaluations.set(self.evaluations.get() + 1);
        let outcome = evaluate_list(page, &self.region, &self.settings);
        trace!(
            "event=list_eval module=monitor status=ok trigger=activate targets={} outcome={:?}",
            targets.len(),
            outcome
        );
        Some(outcome)
    }

    /// Releases the subscription.
    ///
    /// Returns `false` (and logs a warning) when the monitor was not active.
    pub fn deactivate(&mut self) -> bool {
        if !self.is_active() {
            warn!("event=list_deactivate module=monitor status=skip reason=not_active");
            return false;
        }

        if let Some(subscription) = self.subscription.take() {
            subscription.disconnect();
        }
        self.state = MonitorState::Inactive;
        true
    }

    /// Reads the list's current state from the page.
    pub fn snapshot(&self, page: &P) -> ListSnapshot {
        let title = page
            .query_selector(&self.region, &self.settings.heading)
            .map(|heading| page.text_content(&heading))
            .unwrap_or_default();
        let card_count = page
            .query_selector(&self.region, &self.settings.counter)
            .and_then(|counter| parse_card_count(&page.text_content(&counter)));

        ListSnapshot {
            max_capacity: parse_max_cards(&title),
            title,
            card_count,
            overloaded: has_class(&page.class_name(&self.region), &self.settings.overloaded_class),
        }
    }
}
