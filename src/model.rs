use serde::{Deserialize, Serialize};

/// Territory assigned to a zipcode when the caller does not name one.
pub const DEFAULT_TERRITORY: &str = "Lacy Boulevard";

/// Work state of a claimed segment.
///
/// Stored as its display text in the `segments.status` column. Any state may
/// transition to any other; new segments always start as `NotStarted`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SegmentStatus {
    #[serde(rename = "Not started")]
    NotStarted,
    #[serde(rename = "In progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::NotStarted => "Not started",
            SegmentStatus::InProgress => "In progress",
            SegmentStatus::Completed => "Completed",
        }
    }

    pub fn parse_status(s: &str) -> Option<Self> {
        match s {
            "Not started" => Some(SegmentStatus::NotStarted),
            "In progress" => Some(SegmentStatus::InProgress),
            "Completed" => Some(SegmentStatus::Completed),
            _ => None,
        }
    }
}
