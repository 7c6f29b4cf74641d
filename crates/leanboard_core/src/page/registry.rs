//! Observer registrations and their pending batches.

use super::document::{NodeId, SequencedRecord};
use super::Page;
use crate::host::{MutationCallback, MutationRecord, ObserveOptions, SubscriptionId};
use std::collections::BTreeMap;

/// One observer registration and its undelivered records.
pub(crate) struct Registration {
    targets: Vec<NodeId>,
    options: ObserveOptions,
    since_seq: u64,
    queue: Vec<MutationRecord<NodeId>>,
    /// `None` while the callback is being invoked.
    callback: Option<MutationCallback<Page>>,
}

impl Registration {
    fn wants(&self, entry: &SequencedRecord) -> bool {
        entry.seq >= self.since_seq
            && self.options.accepts(entry.record.kind)
            && self.targets.contains(&entry.record.target)
    }
}

/// One batch taken out for delivery.
pub(crate) struct Batch {
    pub id: SubscriptionId,
    pub records: Vec<MutationRecord<NodeId>>,
    pub callback: MutationCallback<Page>,
}

/// All live registrations, keyed in creation order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    registrations: BTreeMap<SubscriptionId, Registration>,
}

impl ObserverRegistry {
    pub fn register(
        &mut self,
        targets: Vec<NodeId>,
        options: ObserveOptions,
        since_seq: u64,
        callback: MutationCallback<Page>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.registrations.insert(
            id,
            Registration {
                targets,
                options,
                since_seq,
                queue: Vec::new(),
                callback: Some(callback),
            },
        );
        id
    }

    /// Removes a registration; queued records are discarded with it.
    ///
    /// The removed value is returned so the caller drops the callback after
    /// releasing its borrow of the registry.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<Registration> {
        self.registrations.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.registrations.contains_key(&id)
    }

    pub fn has_queued(&self) -> bool {
        self.registrations
            .values()
            .any(|registration| !registration.queue.is_empty())
    }

    /// Routes records to every registration observing their target.
    pub fn enqueue(&mut self, records: Vec<SequencedRecord>) {
        for entry in records {
            for registration in self.registrations.values_mut() {
                if registration.wants(&entry) {
                    registration.queue.push(entry.record.clone());
                }
            }
        }
    }

    /// Takes the oldest registration's queued batch and its callback.
    pub fn take_next_batch(&mut self) -> Option<Batch> {
        let (id, registration) = self
            .registrations
            .iter_mut()
            .find(|(_, registration)| {
                !registration.queue.is_empty() && registration.callback.is_some()
            })?;
        let callback = registration.callback.take()?;
        Some(Batch {
            id: *id,
            records: std::mem::take(&mut registration.queue),
            callback,
        })
    }

    /// Puts a callback back after delivery.
    ///
    /// Returns the callback when its registration was removed meanwhile; the
    /// caller drops it outside the registry borrow.
    pub fn restore_callback(
        &mut self,
        id: SubscriptionId,
        callback: MutationCallback<Page>,
    ) -> Option<MutationCallback<Page>> {
        match self.registrations.get_mut(&id) {
            Some(registration) => {
                registration.callback = Some(callback);
                None
            }
            None => Some(callback),
        }
    }
}
