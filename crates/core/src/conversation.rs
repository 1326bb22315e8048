//! Conversation status vocabulary and lifecycle rules.
//!
//! Statuses are persisted as lowercase strings. A customer message always
//! leaves its conversation `open`, whatever the previous status was; `new`
//! only exists between creation and the first stored message.
//! Conversation numbers start at 1 per (customer, integration).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Integration kind served by the widget endpoints.
pub const MESSENGER_KIND: &str = "messenger";

pub const STATUS_NEW: &str = "new";
pub const STATUS_OPEN: &str = "open";
pub const STATUS_CLOSED: &str = "closed";

/// Every valid conversation status, in lifecycle order.
pub const ALL_STATUSES: [&str; 3] = [STATUS_NEW, STATUS_OPEN, STATUS_CLOSED];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    New,
    Open,
    Closed,
}

impl ConversationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => STATUS_NEW,
            Self::Open => STATUS_OPEN,
            Self::Closed => STATUS_CLOSED,
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            STATUS_NEW => Ok(Self::New),
            STATUS_OPEN => Ok(Self::Open),
            STATUS_CLOSED => Ok(Self::Closed),
            other => Err(CoreError::Validation(format!(
                "Unknown conversation status '{other}', expected one of {ALL_STATUSES:?}"
            ))),
        }
    }
}

impl TryFrom<String> for ConversationStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Sequence number for the next conversation of a (customer, integration)
/// pair, given how many already exist.
pub fn next_conversation_number(existing: i64) -> i32 {
    i32::try_from(existing.max(0) + 1).unwrap_or(i32::MAX)
}
