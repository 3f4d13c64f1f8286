use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Intents the webhook knows how to fulfil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Offer the cold-start books
    ColdStart,
    /// Recommend books from submitted cold-start ratings
    Recommend,
}

impl Intent {
    pub const ALL: [Intent; 2] = [Intent::ColdStart, Intent::Recommend];

    /// Fulfillment tag configured on the dialogue platform
    pub fn tag(&self) -> &'static str {
        match self {
            Intent::ColdStart => "top5",
            Intent::Recommend => "cf",
        }
    }

    /// Maps a fulfillment tag to an intent; unknown tags are rejected
    pub fn from_tag(tag: &str) -> AppResult<Self> {
        Self::ALL
            .into_iter()
            .find(|intent| intent.tag() == tag)
            .ok_or_else(|| AppError::UnrecognizedIntent(tag.to_string()))
    }
}

impl Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}
