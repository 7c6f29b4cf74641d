//! Report lines printed after the initial load and after each step.

use leanboard_core::ListSnapshot;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub step: String,
    pub switches: u64,
    pub lists: Vec<ListSnapshot>,
}

impl StepReport {
    pub fn render_text(&self) -> String {
        let mut out = format!("== {} (switches={})\n", self.step, self.switches);
        if self.lists.is_empty() {
            out.push_str("  (no lists)\n");
        }
        for list in &self.lists {
            let marker = if list.overloaded { "OVER" } else { " ok " };
            out.push_str(&format!(
                "  [{marker}] {} cards={} max={}\n",
                list.title,
                display_number(list.card_count),
                display_number(list.max_capacity)
            ));
        }
        out
    }

    pub fn render_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn display_number(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}
