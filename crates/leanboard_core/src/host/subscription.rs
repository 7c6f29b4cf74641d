//! Revocable observation handles.
//!
//! # Invariants
//! - A subscription is released exactly once: by `disconnect` or on drop.
//! - After release, the host must not invoke the registration's callback again.

use std::fmt::{Debug, Display, Formatter};

/// Stable identifier of one host observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Owned handle for one observer registration.
///
/// Not `Clone`: ownership is the capability to revoke.
pub struct Subscription {
    id: SubscriptionId,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps a host registration with its release hook.
    pub fn new(id: SubscriptionId, release: impl FnOnce() + 'static) -> Self {
        Self {
            id,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stops all future callbacks from this registration.
    pub fn disconnect(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("connected", &self.release.is_some())
            .finish()
    }
}
