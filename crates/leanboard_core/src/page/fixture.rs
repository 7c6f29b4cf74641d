//! Board markup builders for the in-memory page.
//!
//! # Responsibility
//! - Describe boards as serde documents (`BoardFixture`).
//! - Render them into host-shaped markup under a `#content` container.
//!
//! # Invariants
//! - Mounting a board replaces the container's children with one record, the
//!   way a client-side navigation swaps the board.
//! - Built subtrees use the default selectors of `MonitorSettings`.

use super::document::{DocumentResult, NodeId};
use super::Page;
use crate::host::HostPage;
use serde::{Deserialize, Serialize};

pub const CONTENT_ID: &str = "content";
pub const BOARD_CLASS: &str = "board-wrapper";
pub const LIST_CLASS: &str = "list js-list";
pub const LIST_HEADER_CLASS: &str = "list-header";
pub const HEADING_CLASS: &str = "list-header-name";
pub const COUNTER_CLASS: &str = "js-num-cards";

/// One list as authored in a fixture document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListFixture {
    pub title: String,
    #[serde(default)]
    pub cards: u32,
    /// Raw counter text; overrides the label rendered from `cards`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_text: Option<String>,
}

impl ListFixture {
    pub fn new(title: impl Into<String>, cards: u32) -> Self {
        Self {
            title: title.into(),
            cards,
            counter_text: None,
        }
    }

    /// Counter text as it will appear on the page.
    pub fn counter_label(&self) -> String {
        self.counter_text
            .clone()
            .unwrap_or_else(|| format_card_count(self.cards))
    }
}

/// One board as authored in a fixture document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardFixture {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lists: Vec<ListFixture>,
}

impl BoardFixture {
    pub fn new(name: impl Into<String>, lists: Vec<ListFixture>) -> Self {
        Self {
            name: name.into(),
            lists,
        }
    }
}

/// Element handles of one rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHandles {
    pub region: NodeId,
    pub heading: NodeId,
    pub counter: NodeId,
}

/// Element handles of one mounted board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedBoard {
    pub content: NodeId,
    pub board: NodeId,
    pub lists: Vec<ListHandles>,
}

/// Renders a card count the way the host's counter label reads.
pub fn format_card_count(cards: u32) -> String {
    if cards == 1 {
        "1 card".to_string()
    } else {
        format!("{cards} cards")
    }
}

impl Page {
    /// Creates a page with `body > div#content` and returns the container.
    pub fn with_content_container() -> DocumentResult<(Self, NodeId)> {
        let page = Self::new();
        let body = page.create_element("body");
        let content = page.create_element("div");
        page.set_attribute(content, "id", CONTENT_ID)?;
        page.append_child(body, content)?;
        page.append_child(page.document_element(), body)?;
        Ok((page, content))
    }

    /// Renders `fixture` and swaps it in as the container's only child.
    pub fn mount_board(
        &self,
        content: NodeId,
        fixture: &BoardFixture,
    ) -> DocumentResult<MountedBoard> {
        let board = self.create_element("div");
        self.set_attribute(board, "class", BOARD_CLASS)?;
        self.set_attribute(board, "data-board", &fixture.name)?;

        let mut lists = Vec::with_capacity(fixture.lists.len());
        for list in &fixture.lists {
            let handles = self.build_list(list)?;
            self.append_child(board, handles.region)?;
            lists.push(handles);
        }

        self.replace_children(content, &[board])?;
        Ok(MountedBoard {
            content,
            board,
            lists,
        })
    }

    /// Renders one detached list region.
    pub fn build_list(&self, fixture: &ListFixture) -> DocumentResult<ListHandles> {
        let region = self.create_element("div");
        self.set_attribute(region, "class", LIST_CLASS)?;

        let header = self.create_element("div");
        self.set_attribute(header, "class", LIST_HEADER_CLASS)?;

        let heading = self.create_element("h2");
        self.set_attribute(heading, "class", HEADING_CLASS)?;
        self.set_text(heading, &fixture.title)?;

        let counter = self.create_element("span");
        self.set_attribute(counter, "class", COUNTER_CLASS)?;
        self.set_text(counter, &fixture.counter_label())?;

        self.append_child(header, heading)?;
        self.append_child(header, counter)?;
        self.append_child(region, header)?;

        Ok(ListHandles {
            region,
            heading,
            counter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{format_card_count, BoardFixture, ListFixture, CONTENT_ID};
    use crate::host::{HostPage, Selector};
    use crate::page::Page;

    #[test]
    fn formats_counter_labels() {
        assert_eq!(format_card_count(0), "0 cards");
        assert_eq!(format_card_count(1), "1 card");
        assert_eq!(format_card_count(4), "4 cards");
    }

    #[test]
    fn counter_text_overrides_card_count() {
        let mut list = ListFixture::new("Doing", 3);
        list.counter_text = Some("n/a".to_string());
        assert_eq!(list.counter_label(), "n/a");
    }

    #[test]
    fn mounts_board_under_content_container() {
        let (page, content) = Page::with_content_container().expect("scaffold");
        let fixture = BoardFixture::new(
            "Sprint",
            vec![ListFixture::new("Doing (max 3)", 4), ListFixture::new("Done", 9)],
        );
        let mounted = page.mount_board(content, &fixture).expect("mount");

        let root = page.document_element();
        let by_id = Selector::parse(&format!("#{CONTENT_ID}")).expect("selector");
        assert_eq!(page.query_selector(&root, &by_id), Some(content));

        let lists = page.query_selector_all(&root, &Selector::parse(".list").expect("selector"));
        assert_eq!(
            lists,
            mounted.lists.iter().map(|list| list.region).collect::<Vec<_>>()
        );
        assert_eq!(page.text_content(&mounted.lists[0].heading), "Doing (max 3)");
        assert_eq!(page.text_content(&mounted.lists[1].counter), "9 cards");
    }

    #[test]
    fn deserializes_fixture_documents() {
        let fixture: BoardFixture = serde_json::from_value(serde_json::json!({
            "name": "Ops",
            "lists": [
                { "title": "Doing (max 2)", "cards": 3 },
                { "title": "Blocked", "counter_text": "unknown" }
            ]
        }))
        .expect("fixture should deserialize");

        assert_eq!(fixture.lists.len(), 2);
        assert_eq!(fixture.lists[1].cards, 0);
        assert_eq!(fixture.lists[1].counter_label(), "unknown");
    }

    #[test]
    fn rejects_unknown_fixture_fields() {
        let result = serde_json::from_value::<BoardFixture>(serde_json::json!({
            "name": "Ops",
            "columns": []
        }));
        assert!(result.is_err());
    }
}
