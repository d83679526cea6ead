use serde::{Deserialize, Serialize};

use super::state::Progress;

pub const DEFAULT_STATUS_FORMAT: &str = "{progress}|{grace}";

/// Template for the status slot. Recognised placeholders: `{progress}`,
/// `{grace}` and `{goal}`; anything else is copied through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusFormat(String);

impl StatusFormat {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, progress: &Progress, goal_amount: u32, remaining_grace: i64) -> String {
        self.0
            .replace("{progress}", &progress.to_string())
            .replace("{grace}", &remaining_grace.to_string())
            .replace("{goal}", &goal_amount.to_string())
    }
}

impl Default for StatusFormat {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_FORMAT)
    }
}
