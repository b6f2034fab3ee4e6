//! HTTP layer: one handler per REST operation, each with an explicit request
//! struct. Handlers translate query/body parameters into store calls and map
//! failures onto the [`ApiError`] taxonomy at this boundary.

use crate::db::{self, Pool};
use crate::error::ApiError;
use crate::model::{SegmentStatus, DEFAULT_TERRITORY};
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

pub fn router(pool: Pool) -> Router {
    Router::new()
        .route("/zipcodes", get(list_zipcodes).post(create_zipcode))
        .route(
            "/segments",
            get(list_segments)
                .post(claim_segment)
                .patch(update_segment)
                .delete(delete_segment),
        )
        .route("/segments/mine", get(my_segments))
        .route("/users", get(list_users).post(register_user))
        .route("/healthz", get(healthz))
        .with_state(pool)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// GET /zipcodes
#[instrument(skip_all)]
async fn list_zipcodes(
    State(pool): State<Pool>,
) -> Result<Json<Vec<db::ZipcodeSummary>>, ApiError> {
    db::ensure_schema(&pool).await?;
    Ok(Json(db::list_zipcodes(&pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateZipcode {
    pub city: Option<String>,
    pub zipcode: Option<String>,
    pub total_pages: Option<i64>,
    /// Defaults to [`DEFAULT_TERRITORY`] when omitted.
    pub territory: Option<String>,
}

// POST /zipcodes
#[instrument(skip_all)]
async fn create_zipcode(
    State(pool): State<Pool>,
    Json(req): Json<CreateZipcode>,
) -> Result<Json<db::Zipcode>, ApiError> {
    db::ensure_schema(&pool).await?;

    let city = req.city.as_deref().unwrap_or("").trim().to_string();
    let zipcode = req.zipcode.as_deref().unwrap_or("").trim().to_string();
    let total_pages = req.total_pages.unwrap_or(0);
    let territory = req
        .territory
        .as_deref()
        .unwrap_or(DEFAULT_TERRITORY)
        .trim()
        .to_string();

    if city.is_empty() || zipcode.is_empty() || total_pages <= 0 {
        return Err(ApiError::validation(
            "city, zipcode, and total_pages are required",
        ));
    }

    match db::create_zipcode(&pool, &city, &zipcode, total_pages, &territory).await? {
        Some(row) => Ok(Json(row)),
        None => Err(ApiError::conflict("Zipcode already exists")),
    }
}

#[derive(Debug, Deserialize)]
pub struct SegmentsQuery {
    pub zipcode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SegmentListing {
    pub zipcode: db::ZipcodeInfo,
    pub segments: Vec<db::Segment>,
}

// GET /segments?zipcode=22030
#[instrument(skip_all)]
async fn list_segments(
    State(pool): State<Pool>,
    Query(q): Query<SegmentsQuery>,
) -> Result<Json<SegmentListing>, ApiError> {
    db::ensure_schema(&pool).await?;
    let zipcode = q
        .zipcode
        .ok_or_else(|| ApiError::validation("Missing zipcode"))?;

    let Some(z) = db::find_zipcode(&pool, &zipcode).await? else {
        return Err(ApiError::not_found("Zipcode not found"));
    };
    let segments = db::list_segments(&pool, z.id).await?;
    Ok(Json(SegmentListing {
        zipcode: db::ZipcodeInfo {
            city: z.city,
            zipcode: z.zipcode,
            total_pages: z.total_pages,
        },
        segments,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ClaimSegment {
    pub zipcode: Option<String>,
    pub page_start: Option<i64>,
    /// Absent for an open-ended "+" claim.
    pub page_end: Option<i64>,
    pub owner: Option<String>,
}

// POST /segments
#[instrument(skip_all)]
async fn claim_segment(
    State(pool): State<Pool>,
    Json(req): Json<ClaimSegment>,
) -> Result<Json<db::Segment>, ApiError> {
    db::ensure_schema(&pool).await?;

    let (Some(zipcode), Some(page_start), Some(owner)) = (req.zipcode, req.page_start, req.owner)
    else {
        return Err(ApiError::validation("Missing fields"));
    };
    if zipcode.trim().is_empty() || owner.trim().is_empty() {
        return Err(ApiError::validation("Missing fields"));
    }
    if page_start < 1 {
        return Err(ApiError::validation("page_start must be at least 1"));
    }
    if let Some(page_end) = req.page_end {
        if page_end <= page_start {
            return Err(ApiError::validation(
                "page_end must be greater than page_start",
            ));
        }
    }

    let Some(z) = db::find_zipcode(&pool, &zipcode).await? else {
        return Err(ApiError::not_found("Zipcode not found"));
    };
    // Page bounds against total_pages are advisory; overlapping claims are
    // allowed to coexist.
    let segment = db::claim_segment(&pool, z.id, page_start, req.page_end, &owner).await?;
    Ok(Json(segment))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSegment {
    pub id: Option<i64>,
    pub stopped_at_page: Option<i64>,
    pub status: Option<SegmentStatus>,
    pub owner: Option<String>,
    pub notes: Option<String>,
    pub page_start: Option<i64>,
    pub page_end: Option<i64>,
    /// Selects range-update mode: overwrite page_start/page_end instead of
    /// the progress fields. Requires page_start.
    #[serde(default)]
    pub update_range: bool,
}

// PATCH /segments
#[instrument(skip_all)]
async fn update_segment(
    State(pool): State<Pool>,
    Json(req): Json<UpdateSegment>,
) -> Result<Json<db::Segment>, ApiError> {
    db::ensure_schema(&pool).await?;

    let id = req.id.ok_or_else(|| ApiError::validation("Missing id"))?;
    let status = req.status.map(|s| s.as_str());

    let updated = if req.update_range && req.page_start.is_some() {
        let page_start = req.page_start.unwrap_or(1);
        if page_start < 1 {
            return Err(ApiError::validation("page_start must be at least 1"));
        }
        if let Some(page_end) = req.page_end {
            if page_end <= page_start {
                return Err(ApiError::validation(
                    "page_end must be greater than page_start",
                ));
            }
        }
        db::update_segment_range(
            &pool,
            id,
            page_start,
            req.page_end,
            req.stopped_at_page,
            status,
        )
        .await?
    } else {
        db::update_segment_fields(
            &pool,
            id,
            req.stopped_at_page,
            status,
            req.owner.as_deref(),
            req.notes.as_deref(),
        )
        .await?
    };

    match updated {
        Some(row) => Ok(Json(row)),
        None => Err(ApiError::not_found("Segment not found")),
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<i64>,
}

// DELETE /segments?id=7
#[instrument(skip_all)]
async fn delete_segment(
    State(pool): State<Pool>,
    Query(q): Query<DeleteQuery>,
) -> Result<Json<Value>, ApiError> {
    db::ensure_schema(&pool).await?;
    let id = q.id.ok_or_else(|| ApiError::validation("Missing id"))?;
    if !db::delete_segment(&pool, id).await? {
        return Err(ApiError::not_found("Segment not found"));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct MineQuery {
    pub owner: Option<String>,
}

// GET /segments/mine?owner=Boris
#[instrument(skip_all)]
async fn my_segments(
    State(pool): State<Pool>,
    Query(q): Query<MineQuery>,
) -> Result<Json<Vec<db::OwnedSegment>>, ApiError> {
    db::ensure_schema(&pool).await?;
    let owner = q.owner.ok_or_else(|| ApiError::validation("Missing owner"))?;
    Ok(Json(db::list_segments_for_owner(&pool, &owner).await?))
}

// GET /users
#[instrument(skip_all)]
async fn list_users(State(pool): State<Pool>) -> Result<Json<Vec<String>>, ApiError> {
    db::ensure_schema(&pool).await?;
    Ok(Json(db::list_known_users(&pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    pub name: Option<String>,
}

// POST /users
#[instrument(skip_all)]
async fn register_user(
    State(pool): State<Pool>,
    Json(req): Json<RegisterUser>,
) -> Result<Json<Value>, ApiError> {
    db::ensure_schema(&pool).await?;
    let name = req.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("name is required"));
    }
    db::register_user(&pool, &name).await?;
    Ok(Json(json!({ "success": true })))
}
