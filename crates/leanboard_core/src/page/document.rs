//! Arena-backed element tree with mutation recording.
//!
//! # Responsibility
//! - Own element storage, attributes, text runs and parent/child links.
//! - Record one mutation per structural, attribute or text change.
//!
//! # Invariants
//! - `NodeId`s are never reused; detached nodes stay addressable.
//! - The tree never contains cycles.
//! - Records carry a monotonically increasing sequence number.

use crate::host::{MutationKind, MutationRecord, Selector, SelectorView};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const CLASS_ATTRIBUTE: &str = "class";
const ID_ATTRIBUTE: &str = "id";

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Arena index of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Tree edit errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    UnknownNode(NodeId),
    NotAChild { parent: NodeId, child: NodeId },
    HierarchyCycle { parent: NodeId, child: NodeId },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(node) => write!(f, "unknown node: {node}"),
            Self::NotAChild { parent, child } => {
                write!(f, "{child} is not a child of {parent}")
            }
            Self::HierarchyCycle { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl Error for DocumentError {}

/// Mutation record stamped with its position in the document history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SequencedRecord {
    pub seq: u64,
    pub record: MutationRecord<NodeId>,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// In-memory element tree.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
    root: NodeId,
    pending: Vec<SequencedRecord>,
    next_seq: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding a single `html` root element.
    pub fn new() -> Self {
        Self {
            elements: vec![Element::new("html")],
            root: NodeId(0),
            pending: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.elements.len()
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.elements.len());
        self.elements.push(Element::new(tag));
        id
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.require(parent)?;
        self.require(child)?;
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DocumentError::HierarchyCycle { parent, child });
        }

        self.detach(child);
        self.elements[parent.index()].children.push(child);
        self.elements[child.index()].parent = Some(parent);
        self.record(parent, MutationKind::ChildList, None);
        Ok(())
    }

    /// Removes `child` from `parent`; the child stays addressable.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DocumentResult<()> {
        self.require(parent)?;
        self.require(child)?;
        if self.elements[child.index()].parent != Some(parent) {
            return Err(DocumentError::NotAChild { parent, child });
        }

        self.detach(child);
        Ok(())
    }

    /// Swaps all children of `parent` for `children` with one record.
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> DocumentResult<()> {
        self.require(parent)?;
        for &child in children {
            self.require(child)?;
            if self.is_inclusive_ancestor(child, parent) {
                return Err(DocumentError::HierarchyCycle { parent, child });
            }
        }

        let previous = std::mem::take(&mut self.elements[parent.index()].children);
        for old in previous {
            self.elements[old.index()].parent = None;
        }
        for &child in children {
            if let Some(old_parent) = self.elements[child.index()].parent {
                self.unlink(old_parent, child);
                self.record(old_parent, MutationKind::ChildList, None);
            }
            self.elements[child.index()].parent = Some(parent);
            self.elements[parent.index()].children.push(child);
        }
        self.record(parent, MutationKind::ChildList, None);
        Ok(())
    }

    /// Replaces the node's content with a single text run.
    ///
    /// Element children are detached, matching `textContent` assignment.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> DocumentResult<()> {
        self.require(node)?;
        let previous = std::mem::take(&mut self.elements[node.index()].children);
        for old in previous {
            self.elements[old.index()].parent = None;
        }
        self.elements[node.index()].text = text.to_string();
        self.record(node, MutationKind::ChildList, None);
        Ok(())
    }

    /// Edits the node's own text run in place.
    pub fn edit_text(&mut self, node: NodeId, text: &str) -> DocumentResult<()> {
        self.require(node)?;
        self.elements[node.index()].text = text.to_string();
        self.record(node, MutationKind::CharacterData, None);
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DocumentResult<()> {
        self.require(node)?;
        self.elements[node.index()]
            .attributes
            .insert(name.to_string(), value.to_string());
        self.record(node, MutationKind::Attributes, Some(name));
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DocumentResult<()> {
        self.require(node)?;
        if self.elements[node.index()].attributes.remove(name).is_some() {
            self.record(node, MutationKind::Attributes, Some(name));
        }
        Ok(())
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attributes.get(name).map(String::as_str)
    }

    pub fn class_name(&self, node: NodeId) -> &str {
        self.attribute(node, CLASS_ATTRIBUTE).unwrap_or("")
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.element(node)
            .map(|element| element.children.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the node is reachable from the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(node) && self.is_inclusive_ancestor(self.root, node)
    }

    /// Own text followed by descendant text, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    /// Descendants of `scope` matching `selector`, in document order.
    pub fn query_selector_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut matches = Vec::new();
        let mut stack = self.children(scope).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node, scope) {
                matches.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        matches
    }

    pub fn query_selector(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut stack = self.children(scope).iter().rev().copied().collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node, scope) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Number of records not yet handed to observers.
    pub fn pending_records(&self) -> usize {
        self.pending.len()
    }

    /// Sequence number the next record will carry.
    pub(crate) fn next_seq(&self) -> u64 {
        self.next_seq
    }

    pub(crate) fn take_records(&mut self) -> Vec<SequencedRecord> {
        std::mem::take(&mut self.pending)
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.index())
    }

    fn require(&self, node: NodeId) -> DocumentResult<()> {
        if self.contains(node) {
            Ok(())
        } else {
            Err(DocumentError::UnknownNode(node))
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.elements[child.index()].parent.take() {
            self.unlink(parent, child);
            self.record(parent, MutationKind::ChildList, None);
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        self.elements[parent.index()]
            .children
            .retain(|candidate| *candidate != child);
        self.elements[child.index()].parent = None;
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(element) = self.element(node) else {
            return;
        };
        out.push_str(&element.text);
        for &child in &element.children {
            self.collect_text(child, out);
        }
    }

    fn record(&mut self, target: NodeId, kind: MutationKind, attribute_name: Option<&str>) {
        self.pending.push(SequencedRecord {
            seq: self.next_seq,
            record: MutationRecord {
                target,
                kind,
                attribute_name: attribute_name.map(str::to_string),
            },
        });
        self.next_seq += 1;
    }
}

impl SelectorView<NodeId> for Document {
    fn tag_of(&self, node: NodeId) -> &str {
        self.tag(node).unwrap_or("")
    }

    fn id_of(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, ID_ATTRIBUTE)
    }

    fn class_name_of(&self, node: NodeId) -> &str {
        self.class_name(node)
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node)
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, DocumentError, NodeId};
    use crate::host::{MutationKind, Selector};

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn node_ids_index_past_u32_range() {
        let beyond = u32::MAX as usize + 1;
        let id = NodeId(beyond);
        assert_eq!(id.index(), beyond);
        assert_eq!(id.to_string(), format!("node-{beyond}"));
        assert!(!Document::new().contains(id));
    }

    #[test]
    fn append_records_child_list_on_parent() {
        let mut doc = Document::new();
        let child = doc.create_element("DIV");
        doc.append_child(doc.root(), child).expect("append");

        assert_eq!(doc.tag(child), Some("div"));
        assert!(doc.is_connected(child));
        let records = doc.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.target, doc.root());
        assert_eq!(records[0].record.kind, MutationKind::ChildList);
    }

    #[test]
    fn rejects_cycles_and_foreign_children() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).expect("append");

        let err = doc.append_child(inner, outer).expect_err("cycle must fail");
        assert!(matches!(err, DocumentError::HierarchyCycle { .. }));

        let err = doc
            .remove_child(doc.root(), inner)
            .expect_err("non-child removal must fail");
        assert!(matches!(err, DocumentError::NotAChild { .. }));
    }

    #[test]
    fn moving_a_node_records_both_parents() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let item = doc.create_element("span");
        doc.append_child(a, item).expect("append to a");
        doc.take_records();

        doc.append_child(b, item).expect("move to b");
        let targets = doc
            .take_records()
            .into_iter()
            .map(|entry| entry.record.target)
            .collect::<Vec<_>>();
        assert_eq!(targets, vec![a, b]);
        assert!(doc.children(a).is_empty());
    }

    #[test]
    fn text_edits_use_distinct_record_kinds() {
        let mut doc = Document::new();
        let heading = doc.create_element("h2");
        doc.set_text(heading, "Doing").expect("set text");
        doc.edit_text(heading, "Doing (max 3)").expect("edit text");

        let kinds = doc
            .take_records()
            .into_iter()
            .map(|entry| entry.record.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![MutationKind::ChildList, MutationKind::CharacterData]);
        assert_eq!(doc.text_content(heading), "Doing (max 3)");
    }

    #[test]
    fn sequence_numbers_increase() {
        let mut doc = Document::new();
        let node = doc.create_element("div");
        doc.set_attribute(node, "class", "list").expect("set class");
        doc.remove_attribute(node, "class").expect("remove class");
        doc.remove_attribute(node, "class").expect("second remove is a no-op");

        let seqs = doc
            .take_records()
            .into_iter()
            .map(|entry| entry.seq)
            .collect::<Vec<_>>();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(doc.next_seq(), 2);
    }

    #[test]
    fn queries_return_document_order() {
        let mut doc = Document::new();
        let board = doc.create_element("div");
        doc.append_child(doc.root(), board).expect("append board");
        let mut lists = Vec::new();
        for _ in 0..3 {
            let list = doc.create_element("div");
            doc.set_attribute(list, "class", "list").expect("class");
            doc.append_child(board, list).expect("append list");
            lists.push(list);
        }

        let selector = Selector::parse(".list").expect("selector");
        assert_eq!(doc.query_selector_all(doc.root(), &selector), lists);
        assert_eq!(doc.query_selector(doc.root(), &selector), Some(lists[0]));
        assert_eq!(doc.query_selector(lists[0], &selector), None);
    }

    #[test]
    fn replace_children_emits_single_record_for_parent() {
        let mut doc = Document::new();
        let content = doc.create_element("div");
        let old_board = doc.create_element("div");
        let new_board = doc.create_element("div");
        doc.append_child(content, old_board).expect("append");
        doc.take_records();

        doc.replace_children(content, &[new_board])
            .expect("replace children");
        let records = doc.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.target, content);
        assert_eq!(doc.parent(old_board), None);
        assert_eq!(doc.children(content), &[new_board]);
    }
}
