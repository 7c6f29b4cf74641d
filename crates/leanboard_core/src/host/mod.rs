//! Host page contract consumed by the monitors.
//!
//! # Responsibility
//! - Describe the queries, text reads and class writes monitors perform.
//! - Describe the observation primitive: async, batched, revocable callbacks.
//!
//! # Invariants
//! - Callbacks fire only for mutations made after registration.
//! - A callback receives one batch per delivery, never an empty batch.
//! - Observation covers the target itself, not its subtree.

pub mod selector;
pub mod subscription;

pub use selector::{Selector, SelectorError, SelectorView};
pub use subscription::{Subscription, SubscriptionId};

use std::fmt::Debug;

/// Kind of change recorded for one observed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Attributes,
    ChildList,
    CharacterData,
}

/// One recorded change on an observed node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub target: N,
    pub kind: MutationKind,
    /// Set for `MutationKind::Attributes`.
    pub attribute_name: Option<String>,
}

/// Which mutation kinds a registration wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserveOptions {
    pub attributes: bool,
    pub child_list: bool,
    pub character_data: bool,
}

impl ObserveOptions {
    /// Attributes, child list and character data.
    pub const ALL: Self = Self {
        attributes: true,
        child_list: true,
        character_data: true,
    };

    pub fn accepts(self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::Attributes => self.attributes,
            MutationKind::ChildList => self.child_list,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self::ALL
    }
}

/// Callback invoked once per delivered batch.
pub type MutationCallback<P> = Box<dyn FnMut(&P, &[MutationRecord<<P as HostPage>::Node>])>;

/// Host page operations used by the monitoring engine.
pub trait HostPage: Sized + 'static {
    /// Handle to one element of the host tree.
    type Node: Clone + PartialEq + Debug + 'static;

    /// Root element that document-wide queries start from.
    fn document_element(&self) -> Self::Node;

    /// First descendant of `scope` matching `selector`, in document order.
    fn query_selector(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node>;

    /// All descendants of `scope` matching `selector`, in document order.
    fn query_selector_all(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: &Self::Node) -> String;

    /// Raw class attribute value (empty when unset).
    fn class_name(&self, node: &Self::Node) -> String;

    /// Replaces the class attribute value.
    fn set_class_name(&self, node: &Self::Node, value: &str);

    /// Registers `callback` for mutations of every node in `targets`.
    fn observe(
        &self,
        targets: &[Self::Node],
        options: ObserveOptions,
        callback: MutationCallback<Self>,
    ) -> Subscription;
}
