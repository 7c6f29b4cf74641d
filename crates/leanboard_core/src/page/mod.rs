//! In-memory host page.
//!
//! # Responsibility
//! - Implement `HostPage` over an arena document and an observer registry.
//! - Deliver mutation batches asynchronously, only when the caller drives
//!   `run_until_idle`, mirroring a browser event-loop turn.
//!
//! # Invariants
//! - Released subscriptions never receive another batch, including batches
//!   queued before release.
//! - No registry or document borrow is held while a callback runs.
//! - Delivery stops after `MAX_DELIVERY_ROUNDS` batches in one run.

pub mod document;
pub mod fixture;
mod registry;

pub use document::{Document, DocumentError, DocumentResult, NodeId};
pub use fixture::{BoardFixture, ListFixture, ListHandles, MountedBoard};

use crate::host::{
    HostPage, MutationCallback, ObserveOptions, Selector, Subscription, SubscriptionId,
};
use log::{debug, warn};
use registry::ObserverRegistry;
use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

const MAX_DELIVERY_ROUNDS: usize = 10_000;

/// Counters from one `run_until_idle` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub batches: usize,
    pub records: usize,
    /// Set when the round cap stopped delivery with work still queued.
    pub truncated: bool,
}

/// Shared handle to one in-memory page.
#[derive(Clone, Default)]
pub struct Page {
    document: Rc<RefCell<Document>>,
    observers: Rc<RefCell<ObserverRegistry>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the document.
    ///
    /// Do not hold the guard across mutations or `run_until_idle`.
    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Runs `edit` with write access to the document.
    pub fn with_document_mut<T>(&self, edit: impl FnOnce(&mut Document) -> T) -> T {
        edit(&mut self.document.borrow_mut())
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.with_document_mut(|doc| doc.create_element(tag))
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.append_child(parent, child))
    }

    pub fn remove_child(&self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.remove_child(parent, child))
    }

    pub fn replace_children(&self, parent: NodeId, children: &[NodeId]) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.replace_children(parent, children))
    }

    pub fn set_text(&self, node: NodeId, text: &str) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.set_text(node, text))
    }

    pub fn edit_text(&self, node: NodeId, text: &str) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.edit_text(node, text))
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> DocumentResult<()> {
        self.with_document_mut(|doc| doc.set_attribute(node, name, value))
    }

    /// Number of live observer registrations.
    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn is_observing(&self, id: SubscriptionId) -> bool {
        self.observers.borrow().contains(id)
    }

    /// Delivers queued mutation batches until nothing is pending.
    ///
    /// Records produced by callbacks are delivered in later rounds of the same
    /// run. Each round hands one registration its whole queued batch.
    pub fn run_until_idle(&self) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        loop {
            let records = self.document.borrow_mut().take_records();
            self.observers.borrow_mut().enqueue(records);

            if report.batches >= MAX_DELIVERY_ROUNDS {
                report.truncated = self.observers.borrow().has_queued();
                if report.truncated {
                    warn!(
                        "event=mutation_delivery module=page status=truncated batches={} records={}",
                        report.batches, report.records
                    );
                }
                break;
            }

            let Some(batch) = self.observers.borrow_mut().take_next_batch() else {
                break;
            };
            let mut callback = batch.callback;
            report.batches += 1;
            report.records += batch.records.len();
            debug!(
                "event=mutation_batch module=page status=deliver subscription={} records={}",
                batch.id,
                batch.records.len()
            );

            callback(self, &batch.records);

            let orphaned = self
                .observers
                .borrow_mut()
                .restore_callback(batch.id, callback);
            drop(orphaned);
        }

        report
    }

    fn release_hook(
        registry: Weak<RefCell<ObserverRegistry>>,
        id: SubscriptionId,
    ) -> impl FnOnce() + 'static {
        move || {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let removed = registry.borrow_mut().remove(id);
            if removed.is_some() {
                debug!("event=observer_release module=page status=ok subscription={id}");
            }
            drop(removed);
        }
    }
}

impl HostPage for Page {
    type Node = NodeId;

    fn document_element(&self) -> NodeId {
        self.document.borrow().root()
    }

    fn query_selector(&self, scope: &NodeId, selector: &Selector) -> Option<NodeId> {
        self.document.borrow().query_selector(*scope, selector)
    }

    fn query_selector_all(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        self.document.borrow().query_selector_all(*scope, selector)
    }

    fn text_content(&self, node: &NodeId) -> String {
        self.document.borrow().text_content(*node)
    }

    fn class_name(&self, node: &NodeId) -> String {
        self.document.borrow().class_name(*node).to_string()
    }

    fn set_class_name(&self, node: &NodeId, value: &str) {
        if let Err(err) = self.set_attribute(*node, "class", value) {
            debug!("event=class_write module=page status=skip node={node} error={err}");
        }
    }

    fn observe(
        &self,
        targets: &[NodeId],
        options: ObserveOptions,
        callback: MutationCallback<Self>,
    ) -> Subscription {
        let since_seq = self.document.borrow().next_seq();
        let id = self
            .observers
            .borrow_mut()
            .register(targets.to_vec(), options, since_seq, callback);
        debug!(
            "event=observer_register module=page status=ok subscription={id} targets={}",
            targets.len()
        );
        Subscription::new(id, Self::release_hook(Rc::downgrade(&self.observers), id))
    }
}
