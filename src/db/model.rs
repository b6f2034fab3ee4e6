//! Database entity and view models used by repositories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One zipcode of the printed directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zipcode {
    pub id: i64,
    pub city: String,
    pub zipcode: String,
    pub total_pages: i64,
    pub territory: String,
    pub created_at: DateTime<Utc>,
}

/// Zipcode annotated with aggregate segment-status counts for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipcodeSummary {
    pub id: i64,
    pub city: String,
    pub zipcode: String,
    pub total_pages: i64,
    pub territory: String,
    pub segment_count: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub not_started: i64,
}

/// A claimed page range within one zipcode's directory.
///
/// `page_end` is null for open-ended ("+") claims. `status` is kept as the
/// raw stored text so rows written before status validation existed still
/// read back untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: i64,
    pub zipcode_id: i64,
    pub page_start: i64,
    pub page_end: Option<i64>,
    pub owner: String,
    pub stopped_at_page: Option<i64>,
    pub status: String,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
}

/// Zipcode metadata echoed alongside a segment listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipcodeInfo {
    pub city: String,
    pub zipcode: String,
    pub total_pages: i64,
}

/// A segment joined with its zipcode metadata, for the cross-zipcode
/// "my segments" view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedSegment {
    pub id: i64,
    pub page_start: i64,
    pub page_end: Option<i64>,
    pub owner: String,
    pub stopped_at_page: Option<i64>,
    pub status: String,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
    pub city: String,
    pub zipcode: String,
    pub total_pages: i64,
}
