//! Scripted board sessions over the in-memory page.
//!
//! # Responsibility
//! - Parse a fixture file: one board plus an optional list of steps.
//! - Mount the board, start a root monitor and replay each step as a page
//!   mutation followed by one delivery run.
//!
//! # Invariants
//! - List indices in steps refer to the current board, in document order.
//! - Every step is fully delivered before the next one is applied.
//! - Every rendered list matches the active list, heading and counter
//!   selectors; a mismatch is an error, never an empty report.

use leanboard_core::page::fixture::format_card_count;
use leanboard_core::{
    BoardFixture, DeliveryReport, DocumentError, HostPage, ListFixture, ListHandles, ListSnapshot,
    MonitorSettings, MountedBoard, NodeId, Page, RootMonitor, Selector,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Fixture document read by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub board: BoardFixture,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ScenarioFile {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        serde_json::from_str(json).map_err(ScenarioError::Json)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

/// One scripted page mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Rewrites a list's counter label.
    SetCards { list: usize, cards: u32 },
    /// Rewrites a list's heading.
    Rename { list: usize, title: String },
    /// Appends a list to the current board element.
    AddList {
        title: String,
        #[serde(default)]
        cards: u32,
    },
    RemoveList { list: usize },
    /// Swaps a new board into the content container.
    Navigate { board: BoardFixture },
}

impl Step {
    /// Short description used in reports.
    pub fn label(&self) -> String {
        match self {
            Self::SetCards { list, cards } => format!("set_cards list={list} cards={cards}"),
            Self::Rename { list, title } => format!("rename list={list} title={title:?}"),
            Self::AddList { title, cards } => format!("add_list title={title:?} cards={cards}"),
            Self::RemoveList { list } => format!("remove_list list={list}"),
            Self::Navigate { board } => format!("navigate board={:?}", board.name),
        }
    }
}

/// Scenario load and replay errors.
#[derive(Debug)]
pub enum ScenarioError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Document(DocumentError),
    MissingContainer(String),
    UnmatchedMarkup {
        field: &'static str,
        selector: String,
    },
    UnknownList {
        index: usize,
        lists: usize,
    },
}

impl Display for ScenarioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read fixture `{}`: {source}", path.display())
            }
            Self::Json(err) => write!(f, "invalid fixture document: {err}"),
            Self::Document(err) => write!(f, "page mutation failed: {err}"),
            Self::MissingContainer(selector) => {
                write!(f, "no content container matches `{selector}`")
            }
            Self::UnmatchedMarkup { field, selector } => write!(
                f,
                "fixture lists render as `{RENDERED_MARKUP}`, which {field} `{selector}` does not match"
            ),
            Self::UnknownList { index, lists } => write!(
                f,
                "list index {index} out of range; the board has {lists} list(s)"
            ),
        }
    }
}

impl Error for ScenarioError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::MissingContainer(_)
            | Self::UnmatchedMarkup { .. }
            | Self::UnknownList { .. } => None,
        }
    }
}

impl From<DocumentError> for ScenarioError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

const RENDERED_MARKUP: &str = "div.list > div.list-header > h2 + span.js-num-cards";

/// Live page, mounted board and the root monitor watching it.
pub struct ScenarioRunner {
    page: Page,
    settings: Rc<MonitorSettings>,
    mounted: MountedBoard,
    root: RootMonitor<Page>,
}

impl ScenarioRunner {
    /// Mounts `board`, then attaches and starts the root monitor.
    pub fn start(board: &BoardFixture, settings: MonitorSettings) -> Result<Self, ScenarioError> {
        let (page, content) = Page::with_content_container()?;
        let mounted = page.mount_board(content, board)?;
        page.run_until_idle();

        let settings = Rc::new(settings);
        let mut root = RootMonitor::attach(&page, Rc::clone(&settings))
            .ok_or_else(|| ScenarioError::MissingContainer(settings.content.to_string()))?;
        check_markup(&page, content, &settings, &mounted.lists)?;
        root.start(&page);
        page.run_until_idle();

        info!(
            "event=scenario_start module=cli status=ok board={:?} lists={}",
            board.name,
            mounted.lists.len()
        );
        Ok(Self {
            page,
            settings,
            mounted,
            root,
        })
    }

    /// Applies one step and delivers every resulting batch.
    pub fn apply(&mut self, step: &Step) -> Result<DeliveryReport, ScenarioError> {
        match step {
            Step::SetCards { list, cards } => {
                let handles = self.list(*list)?;
                self.page
                    .set_text(handles.counter, &format_card_count(*cards))?;
            }
            Step::Rename { list, title } => {
                let handles = self.list(*list)?;
                self.page.set_text(handles.heading, title)?;
            }
            Step::AddList { title, cards } => {
                let handles = self.page.build_list(&ListFixture::new(title.clone(), *cards))?;
                self.page.append_child(self.mounted.board, handles.region)?;
                check_markup(
                    &self.page,
                    self.mounted.content,
                    &self.settings,
                    std::slice::from_ref(&handles),
                )?;
                self.mounted.lists.push(handles);
            }
            Step::RemoveList { list } => {
                let handles = self.list(*list)?;
                self.page.remove_child(self.mounted.board, handles.region)?;
                self.mounted.lists.remove(*list);
            }
            Step::Navigate { board } => {
                self.mounted = self.page.mount_board(self.mounted.content, board)?;
                check_markup(
                    &self.page,
                    self.mounted.content,
                    &self.settings,
                    &self.mounted.lists,
                )?;
            }
        }

        let report = self.page.run_until_idle();
        info!(
            "event=scenario_step module=cli status=ok step={:?} batches={} records={}",
            step.label(),
            report.batches,
            report.records
        );
        Ok(report)
    }

    /// Reports the lists currently monitored by the root.
    pub fn snapshots(&self) -> Vec<ListSnapshot> {
        self.root.snapshots(&self.page)
    }

    pub fn switch_count(&self) -> u64 {
        self.root.switch_count()
    }

    /// Stops the root monitor.
    pub fn finish(mut self) {
        self.root.stop();
    }

    fn list(&self, index: usize) -> Result<ListHandles, ScenarioError> {
        self.mounted
            .lists
            .get(index)
            .copied()
            .ok_or(ScenarioError::UnknownList {
                index,
                lists: self.mounted.lists.len(),
            })
    }
}

/// Fails when the configured selectors would not find the rendered lists.
fn check_markup(
    page: &Page,
    content: NodeId,
    settings: &MonitorSettings,
    lists: &[ListHandles],
) -> Result<(), ScenarioError> {
    let regions = page.query_selector_all(&content, &settings.list);
    for list in lists {
        if !regions.contains(&list.region) {
            return Err(unmatched("list_selector", &settings.list));
        }
        if page.query_selector(&list.region, &settings.heading) != Some(list.heading) {
            return Err(unmatched("heading_selector", &settings.heading));
        }
        if page.query_selector(&list.region, &settings.counter) != Some(list.counter) {
            return Err(unmatched("counter_selector", &settings.counter));
        }
    }
    Ok(())
}

fn unmatched(field: &'static str, selector: &Selector) -> ScenarioError {
    ScenarioError::UnmatchedMarkup {
        field,
        selector: selector.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ScenarioError, ScenarioFile, ScenarioRunner, Step};
    use leanboard_core::MonitorSettings;

    const FIXTURE: &str = r#"{
        "board": {
            "name": "Sprint",
            "lists": [
                { "title": "Doing (max 3)", "cards": 4 },
                { "title": "Backlog", "cards": 100 }
            ]
        },
        "steps": [
            { "action": "set_cards", "list": 0, "cards": 2 },
            { "action": "rename", "list": 1, "title": "Backlog (max 10)" },
            { "action": "add_list", "title": "Review (max 1)", "cards": 2 },
            { "action": "remove_list", "list": 1 },
            { "action": "navigate", "board": { "name": "Next", "lists": [] } }
        ]
    }"#;

    fn overloaded(runner: &ScenarioRunner) -> Vec<bool> {
        runner
            .snapshots()
            .into_iter()
            .map(|snapshot| snapshot.overloaded)
            .collect()
    }

    #[test]
    fn parses_every_step_kind() {
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");
        assert_eq!(file.board.lists.len(), 2);
        assert_eq!(file.steps.len(), 5);
        assert_eq!(file.steps[0], Step::SetCards { list: 0, cards: 2 });
        assert_eq!(file.steps[4].label(), "navigate board=\"Next\"");
    }

    #[test]
    fn rejects_unknown_actions() {
        let err = ScenarioFile::from_json_str(
            r#"{ "board": { "lists": [] }, "steps": [ { "action": "archive" } ] }"#,
        )
        .expect_err("unknown action");
        assert!(matches!(err, ScenarioError::Json(_)));
    }

    #[test]
    fn replays_steps_against_the_root_monitor() {
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");
        let mut runner =
            ScenarioRunner::start(&file.board, MonitorSettings::default()).expect("start");
        assert_eq!(overloaded(&runner), vec![true, false]);

        runner.apply(&file.steps[0]).expect("set_cards");
        assert_eq!(overloaded(&runner), vec![false, false]);

        runner.apply(&file.steps[1]).expect("rename");
        assert_eq!(overloaded(&runner), vec![false, true]);

        // Lists appended inside the board wait for the next container mutation.
        runner.apply(&file.steps[2]).expect("add_list");
        assert_eq!(runner.snapshots().len(), 2);

        runner.apply(&file.steps[3]).expect("remove_list");
        assert_eq!(runner.switch_count(), 1);

        runner.apply(&file.steps[4]).expect("navigate");
        assert_eq!(runner.switch_count(), 2);
        assert!(runner.snapshots().is_empty());
        runner.finish();
    }

    #[test]
    fn out_of_range_list_is_an_error() {
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");
        let mut runner =
            ScenarioRunner::start(&file.board, MonitorSettings::default()).expect("start");

        let err = runner
            .apply(&Step::RemoveList { list: 7 })
            .expect_err("index out of range");
        assert_eq!(err.to_string(), "list index 7 out of range; the board has 2 list(s)");
    }

    #[test]
    fn missing_container_is_reported() {
        let settings = MonitorSettings::from_json_str(r##"{ "content_selector": "#board" }"##)
            .expect("settings");
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");

        let Err(err) = ScenarioRunner::start(&file.board, settings) else {
            panic!("start should fail without a content container");
        };
        assert!(matches!(err, ScenarioError::MissingContainer(selector) if selector == "#board"));
    }

    #[test]
    fn custom_list_selector_is_rejected_instead_of_reporting_nothing() {
        let settings = MonitorSettings::from_json_str(r#"{ "list_selector": "section.column" }"#)
            .expect("settings");
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");

        let Err(err) = ScenarioRunner::start(&file.board, settings) else {
            panic!("start should fail when no rendered list matches");
        };
        assert!(matches!(
            err,
            ScenarioError::UnmatchedMarkup {
                field: "list_selector",
                ..
            }
        ));
    }

    #[test]
    fn heading_and_counter_selectors_must_hit_the_rendered_elements() {
        let file = ScenarioFile::from_json_str(FIXTURE).expect("fixture");

        let settings = MonitorSettings::from_json_str(r#"{ "heading_selector": ":scope h3" }"#)
            .expect("settings");
        let Err(err) = ScenarioRunner::start(&file.board, settings) else {
            panic!("start should fail on a heading mismatch");
        };
        assert!(err.to_string().contains("heading_selector `:scope h3`"));

        let settings = MonitorSettings::from_json_str(r#"{ "counter_selector": ":scope span" }"#)
            .expect("settings");
        assert!(ScenarioRunner::start(&file.board, settings).is_ok());
    }

    #[test]
    fn added_list_markup_is_checked() {
        let settings = MonitorSettings::from_json_str(r#"{ "list_selector": "section.column" }"#)
            .expect("settings");
        let empty = ScenarioFile::from_json_str(r#"{ "board": { "lists": [] } }"#).expect("fixture");
        let mut runner = ScenarioRunner::start(&empty.board, settings).expect("empty board starts");

        let err = runner
            .apply(&Step::AddList {
                title: "Doing (max 1)".to_string(),
                cards: 0,
            })
            .expect_err("added list does not match");
        assert!(matches!(err, ScenarioError::UnmatchedMarkup { .. }));
    }
}
