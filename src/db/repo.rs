use super::model::{OwnedSegment, Segment, Zipcode, ZipcodeSummary};
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

const SEGMENT_COLS: &str =
    "id, zipcode_id, page_start, page_end, owner, stopped_at_page, status, notes, updated_at";
const ZIPCODE_COLS: &str = "id, city, zipcode, total_pages, territory, created_at";

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let opts = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);
    // An in-memory SQLite database exists per connection; a single connection
    // keeps every query on the same schema.
    let max_connections = if normalized.starts_with("sqlite::memory") {
        1
    } else {
        10
    };
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// For file-backed SQLite URLs, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs and other schemes untouched.
fn prepare_sqlite_url(url: &str) -> String {
    let Some(rest) = url.strip_prefix("sqlite:") else {
        return url.to_string();
    };
    if rest.starts_with(":memory") {
        return url.to_string();
    }
    let path = rest.trim_start_matches("//");
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };
    if path.is_empty() {
        return url.to_string();
    }

    let expanded = match (path.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(tail), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), tail),
        _ => path.to_string(),
    };
    if let Some(parent) = std::path::Path::new(&expanded).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match query {
        Some(q) => format!("sqlite://{expanded}?{q}"),
        None => format!("sqlite://{expanded}"),
    }
}

/// Idempotently create the three tables. Safe to call concurrently and at the
/// start of every request; there is no separate migration step.
#[instrument(skip_all)]
pub async fn ensure_schema(pool: &Pool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS zipcodes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            city        TEXT NOT NULL,
            zipcode     TEXT NOT NULL UNIQUE,
            total_pages INTEGER NOT NULL DEFAULT 0,
            territory   TEXT NOT NULL DEFAULT 'Lacy Boulevard',
            created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    // Databases created before territories existed lack the column, and
    // SQLite has no ADD COLUMN IF NOT EXISTS. Probe the table info instead.
    let has_territory: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('zipcodes') WHERE name = 'territory'",
    )
    .fetch_one(pool)
    .await?;
    if has_territory == 0 {
        sqlx::query(
            "ALTER TABLE zipcodes ADD COLUMN territory TEXT NOT NULL DEFAULT 'Lacy Boulevard'",
        )
        .execute(pool)
        .await?;
    }

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS segments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            zipcode_id      INTEGER NOT NULL REFERENCES zipcodes(id) ON DELETE CASCADE,
            page_start      INTEGER NOT NULL,
            page_end        INTEGER,
            owner           TEXT NOT NULL DEFAULT '',
            stopped_at_page INTEGER,
            status          TEXT NOT NULL DEFAULT 'Not started',
            notes           TEXT NOT NULL DEFAULT '',
            updated_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn zipcode_from_row(row: SqliteRow) -> Result<Zipcode> {
    Ok(Zipcode {
        id: row.try_get("id")?,
        city: row.try_get("city")?,
        zipcode: row.try_get("zipcode")?,
        total_pages: row.try_get("total_pages")?,
        territory: row.try_get("territory")?,
        created_at: row.try_get("created_at")?,
    })
}

fn segment_from_row(row: SqliteRow) -> Result<Segment> {
    Ok(Segment {
        id: row.try_get("id")?,
        zipcode_id: row.try_get("zipcode_id")?,
        page_start: row.try_get("page_start")?,
        page_end: row.try_get("page_end")?,
        owner: row.try_get("owner")?,
        stopped_at_page: row.try_get("stopped_at_page")?,
        status: row.try_get("status")?,
        notes: row.try_get("notes")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// All zipcodes with aggregate segment-status counts, ordered for the
/// dashboard: territory, then city, then zipcode. Zipcodes with no segments
/// report zero for every count.
#[instrument(skip_all)]
pub async fn list_zipcodes(pool: &Pool) -> Result<Vec<ZipcodeSummary>> {
    let rows = sqlx::query(
        "SELECT
            z.id,
            z.city,
            z.zipcode,
            z.total_pages,
            z.territory,
            COUNT(s.id) AS segment_count,
            COALESCE(SUM(CASE WHEN s.status = 'Completed'   THEN 1 ELSE 0 END), 0) AS completed,
            COALESCE(SUM(CASE WHEN s.status = 'In progress' THEN 1 ELSE 0 END), 0) AS in_progress,
            COALESCE(SUM(CASE WHEN s.status = 'Not started' THEN 1 ELSE 0 END), 0) AS not_started
         FROM zipcodes z
         LEFT JOIN segments s ON s.zipcode_id = z.id
         GROUP BY z.id
         ORDER BY z.territory, z.city, z.zipcode",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(ZipcodeSummary {
                id: row.try_get("id")?,
                city: row.try_get("city")?,
                zipcode: row.try_get("zipcode")?,
                total_pages: row.try_get("total_pages")?,
                territory: row.try_get("territory")?,
                segment_count: row.try_get("segment_count")?,
                completed: row.try_get("completed")?,
                in_progress: row.try_get("in_progress")?,
                not_started: row.try_get("not_started")?,
            })
        })
        .collect()
}

/// Insert a new zipcode. Returns `None` when the zipcode value already
/// exists; the existing row is left untouched.
#[instrument(skip_all)]
pub async fn create_zipcode(
    pool: &Pool,
    city: &str,
    zipcode: &str,
    total_pages: i64,
    territory: &str,
) -> Result<Option<Zipcode>> {
    let row = sqlx::query(&format!(
        "INSERT INTO zipcodes (city, zipcode, total_pages, territory)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(zipcode) DO NOTHING
         RETURNING {ZIPCODE_COLS}"
    ))
    .bind(city)
    .bind(zipcode)
    .bind(total_pages)
    .bind(territory)
    .fetch_optional(pool)
    .await?;
    row.map(zipcode_from_row).transpose()
}

#[instrument(skip_all)]
pub async fn find_zipcode(pool: &Pool, zipcode: &str) -> Result<Option<Zipcode>> {
    let row = sqlx::query(&format!(
        "SELECT {ZIPCODE_COLS} FROM zipcodes WHERE zipcode = ?"
    ))
    .bind(zipcode)
    .fetch_optional(pool)
    .await?;
    row.map(zipcode_from_row).transpose()
}

/// Upsert by unique zipcode value, used by the seeder. A `None` territory
/// keeps whatever the row already has (or the default on first insert).
#[instrument(skip_all)]
pub async fn upsert_zipcode(
    pool: &Pool,
    city: &str,
    zipcode: &str,
    total_pages: i64,
    territory: Option<&str>,
) -> Result<i64> {
    let id = sqlx::query_scalar(
        "INSERT INTO zipcodes (city, zipcode, total_pages, territory)
         VALUES (?, ?, ?, COALESCE(?, 'Lacy Boulevard'))
         ON CONFLICT(zipcode) DO UPDATE SET
            city        = excluded.city,
            total_pages = excluded.total_pages,
            territory   = COALESCE(?, territory)
         RETURNING id",
    )
    .bind(city)
    .bind(zipcode)
    .bind(total_pages)
    .bind(territory)
    .bind(territory)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Segments of one zipcode, ordered by page_start ascending.
#[instrument(skip_all)]
pub async fn list_segments(pool: &Pool, zipcode_id: i64) -> Result<Vec<Segment>> {
    let rows = sqlx::query(&format!(
        "SELECT {SEGMENT_COLS} FROM segments WHERE zipcode_id = ? ORDER BY page_start"
    ))
    .bind(zipcode_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(segment_from_row).collect()
}

#[instrument(skip_all)]
pub async fn segment_count(pool: &Pool, zipcode_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM segments WHERE zipcode_id = ?")
        .bind(zipcode_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Claim a page range. Status always starts as 'Not started'. Overlapping
/// claims on the same zipcode are allowed to coexist; there is no exclusion
/// constraint on page ranges.
#[instrument(skip_all)]
pub async fn claim_segment(
    pool: &Pool,
    zipcode_id: i64,
    page_start: i64,
    page_end: Option<i64>,
    owner: &str,
) -> Result<Segment> {
    let row = sqlx::query(&format!(
        "INSERT INTO segments (zipcode_id, page_start, page_end, owner, status)
         VALUES (?, ?, ?, ?, 'Not started')
         RETURNING {SEGMENT_COLS}"
    ))
    .bind(zipcode_id)
    .bind(page_start)
    .bind(page_end)
    .bind(owner)
    .fetch_one(pool)
    .await?;
    segment_from_row(row)
}

/// Full-row insert used by the seeder.
#[instrument(skip_all)]
#[allow(clippy::too_many_arguments)]
pub async fn insert_segment(
    pool: &Pool,
    zipcode_id: i64,
    page_start: i64,
    page_end: Option<i64>,
    owner: &str,
    stopped_at_page: Option<i64>,
    status: &str,
    notes: &str,
) -> Result<i64> {
    let id = sqlx::query_scalar(
        "INSERT INTO segments (zipcode_id, page_start, page_end, owner, stopped_at_page, status, notes)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(zipcode_id)
    .bind(page_start)
    .bind(page_end)
    .bind(owner)
    .bind(stopped_at_page)
    .bind(status)
    .bind(notes)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Range-update mode: overwrite page bounds, keep stopped_at_page/status
/// unless new values are supplied. Returns `None` for an unknown id.
#[instrument(skip_all)]
pub async fn update_segment_range(
    pool: &Pool,
    id: i64,
    page_start: i64,
    page_end: Option<i64>,
    stopped_at_page: Option<i64>,
    status: Option<&str>,
) -> Result<Option<Segment>> {
    let row = sqlx::query(&format!(
        "UPDATE segments SET
            page_start      = ?,
            page_end        = ?,
            stopped_at_page = COALESCE(?, stopped_at_page),
            status          = COALESCE(?, status),
            updated_at      = CURRENT_TIMESTAMP
         WHERE id = ?
         RETURNING {SEGMENT_COLS}"
    ))
    .bind(page_start)
    .bind(page_end)
    .bind(stopped_at_page)
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(segment_from_row).transpose()
}

/// Status-update mode: each field keeps its existing value when absent. The
/// single conditional statement is the only "transaction" here; concurrent
/// updates are last-writer-wins with no conflict signaled.
#[instrument(skip_all)]
pub async fn update_segment_fields(
    pool: &Pool,
    id: i64,
    stopped_at_page: Option<i64>,
    status: Option<&str>,
    owner: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<Segment>> {
    let row = sqlx::query(&format!(
        "UPDATE segments SET
            stopped_at_page = COALESCE(?, stopped_at_page),
            status          = COALESCE(?, status),
            owner           = COALESCE(?, owner),
            notes           = COALESCE(?, notes),
            updated_at      = CURRENT_TIMESTAMP
         WHERE id = ?
         RETURNING {SEGMENT_COLS}"
    ))
    .bind(stopped_at_page)
    .bind(status)
    .bind(owner)
    .bind(notes)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(segment_from_row).transpose()
}

/// Delete a segment. Returns false when no row matched.
#[instrument(skip_all)]
pub async fn delete_segment(pool: &Pool, id: i64) -> Result<bool> {
    let deleted: Option<i64> = sqlx::query_scalar("DELETE FROM segments WHERE id = ? RETURNING id")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(deleted.is_some())
}

/// All segments for one owner across zipcodes, matched case- and
/// whitespace-insensitively, ordered with work in progress first.
#[instrument(skip_all)]
pub async fn list_segments_for_owner(pool: &Pool, owner: &str) -> Result<Vec<OwnedSegment>> {
    let rows = sqlx::query(
        "SELECT
            s.id, s.page_start, s.page_end, s.owner, s.stopped_at_page,
            s.status, s.notes, s.updated_at,
            z.city, z.zipcode, z.total_pages
         FROM segments s
         JOIN zipcodes z ON z.id = s.zipcode_id
         WHERE LOWER(TRIM(s.owner)) = LOWER(TRIM(?))
         ORDER BY
            CASE s.status
                WHEN 'In progress' THEN 0
                WHEN 'Not started' THEN 1
                WHEN 'Completed'   THEN 2
            END,
            z.city, z.zipcode, s.page_start",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(OwnedSegment {
                id: row.try_get("id")?,
                page_start: row.try_get("page_start")?,
                page_end: row.try_get("page_end")?,
                owner: row.try_get("owner")?,
                stopped_at_page: row.try_get("stopped_at_page")?,
                status: row.try_get("status")?,
                notes: row.try_get("notes")?,
                updated_at: row.try_get("updated_at")?,
                city: row.try_get("city")?,
                zipcode: row.try_get("zipcode")?,
                total_pages: row.try_get("total_pages")?,
            })
        })
        .collect()
}

/// Known display names: registered users unioned with every distinct
/// non-empty trimmed owner found on segments, sorted. A name can appear here
/// purely by having claimed a segment.
#[instrument(skip_all)]
pub async fn list_known_users(pool: &Pool) -> Result<Vec<String>> {
    let names = sqlx::query_scalar(
        "SELECT name FROM (
            SELECT name FROM users
            UNION
            SELECT DISTINCT TRIM(owner) AS name
            FROM segments
            WHERE owner IS NOT NULL AND TRIM(owner) <> ''
         ) combined
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}

/// Idempotent upsert by unique name.
#[instrument(skip_all)]
pub async fn register_user(pool: &Pool, name: &str) -> Result<()> {
    sqlx::query("INSERT INTO users (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_pool() -> Pool {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        ensure_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn aggregate_counts_sum_to_segment_count() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Fairfax", "22030", 1518, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();

        let a = claim_segment(&pool, z.id, 1, Some(200), "Boris").await.unwrap();
        let b = claim_segment(&pool, z.id, 201, Some(400), "Samantha")
            .await
            .unwrap();
        claim_segment(&pool, z.id, 401, None, "Kimberly").await.unwrap();

        update_segment_fields(&pool, a.id, Some(200), Some("Completed"), None, None)
            .await
            .unwrap()
            .unwrap();
        update_segment_fields(&pool, b.id, Some(250), Some("In progress"), None, None)
            .await
            .unwrap()
            .unwrap();

        let summaries = list_zipcodes(&pool).await.unwrap();
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.segment_count, 3);
        assert_eq!(s.completed + s.in_progress + s.not_started, s.segment_count);
        assert_eq!(s.completed, 1);
        assert_eq!(s.in_progress, 1);
        assert_eq!(s.not_started, 1);
    }

    #[tokio::test]
    async fn empty_zipcode_reports_zero_counts() {
        let pool = setup_pool().await;
        create_zipcode(&pool, "Arlington", "22209", 450, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();

        let summaries = list_zipcodes(&pool).await.unwrap();
        assert_eq!(summaries[0].segment_count, 0);
        assert_eq!(summaries[0].completed, 0);
        assert_eq!(summaries[0].in_progress, 0);
        assert_eq!(summaries[0].not_started, 0);
    }

    #[tokio::test]
    async fn claimed_segment_starts_not_started_and_sorts_by_page_start() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "McLean", "22101", 965, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();

        claim_segment(&pool, z.id, 501, None, "Ann").await.unwrap();
        claim_segment(&pool, z.id, 1, Some(100), "Boris").await.unwrap();

        let segments = list_segments(&pool, z.id).await.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].page_start, 1);
        assert_eq!(segments[1].page_start, 501);
        assert_eq!(segments[1].page_end, None);
        assert_eq!(segments[1].owner, "Ann");
        assert_eq!(segments[1].status, "Not started");
    }

    #[tokio::test]
    async fn status_only_update_leaves_other_fields_alone() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Annandale", "22003", 1461, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();
        let seg = claim_segment(&pool, z.id, 101, Some(300), "Blessing")
            .await
            .unwrap();

        let updated = update_segment_fields(&pool, seg.id, None, Some("Completed"), None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, "Completed");
        assert_eq!(updated.page_start, 101);
        assert_eq!(updated.page_end, Some(300));
        assert_eq!(updated.owner, "Blessing");
        assert_eq!(updated.stopped_at_page, None);
        assert_eq!(updated.notes, "");
    }

    #[tokio::test]
    async fn range_update_overwrites_bounds_and_keeps_status() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Burke", "22015", 1246, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();
        let seg = claim_segment(&pool, z.id, 1, Some(50), "Faye").await.unwrap();
        update_segment_fields(&pool, seg.id, Some(40), Some("In progress"), None, None)
            .await
            .unwrap()
            .unwrap();

        let updated = update_segment_range(&pool, seg.id, 10, None, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.page_start, 10);
        assert_eq!(updated.page_end, None);
        assert_eq!(updated.stopped_at_page, Some(40));
        assert_eq!(updated.status, "In progress");
    }

    #[tokio::test]
    async fn updating_unknown_segment_returns_none() {
        let pool = setup_pool().await;
        let updated = update_segment_fields(&pool, 999, None, Some("Completed"), None, None)
            .await
            .unwrap();
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn deleting_missing_segment_is_reported() {
        let pool = setup_pool().await;
        assert!(!delete_segment(&pool, 42).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_zipcode_is_conflict_and_leaves_row_untouched() {
        let pool = setup_pool().await;
        create_zipcode(&pool, "Fairfax", "22030", 1518, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();

        let second = create_zipcode(&pool, "Elsewhere", "22030", 9, "Woodbridge")
            .await
            .unwrap();
        assert!(second.is_none());

        let existing = find_zipcode(&pool, "22030").await.unwrap().unwrap();
        assert_eq!(existing.city, "Fairfax");
        assert_eq!(existing.total_pages, 1518);
        assert_eq!(existing.territory, "Lacy Boulevard");
    }

    #[tokio::test]
    async fn owners_appear_in_directory_without_registration() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Woodbridge", "22191", 1656, "Woodbridge")
            .await
            .unwrap()
            .unwrap();
        claim_segment(&pool, z.id, 1, Some(20), "Mick").await.unwrap();

        assert_eq!(list_known_users(&pool).await.unwrap(), vec!["Mick"]);

        // Registration stays idempotent and the union stays distinct.
        register_user(&pool, "Mick").await.unwrap();
        register_user(&pool, "Mick").await.unwrap();
        register_user(&pool, "Ann").await.unwrap();
        assert_eq!(list_known_users(&pool).await.unwrap(), vec!["Ann", "Mick"]);
    }

    #[tokio::test]
    async fn owner_match_ignores_case_and_whitespace() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Dumfries", "22025", 515, "Woodbridge")
            .await
            .unwrap()
            .unwrap();
        claim_segment(&pool, z.id, 1, Some(200), " Mick ").await.unwrap();

        let mine = list_segments_for_owner(&pool, "mick").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner, " Mick ");
        assert_eq!(mine[0].zipcode, "22025");
    }

    #[tokio::test]
    async fn owner_listing_orders_in_progress_first() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Arlington", "22201", 1081, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();
        let done = claim_segment(&pool, z.id, 1, Some(50), "Boris").await.unwrap();
        let fresh = claim_segment(&pool, z.id, 51, Some(100), "Boris")
            .await
            .unwrap();
        let active = claim_segment(&pool, z.id, 101, Some(150), "Boris")
            .await
            .unwrap();
        update_segment_fields(&pool, done.id, None, Some("Completed"), None, None)
            .await
            .unwrap();
        update_segment_fields(&pool, active.id, None, Some("In progress"), None, None)
            .await
            .unwrap();

        let mine = list_segments_for_owner(&pool, "Boris").await.unwrap();
        let ids: Vec<i64> = mine.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![active.id, fresh.id, done.id]);
    }

    #[tokio::test]
    async fn round_trip_leaves_zipcode_without_segments() {
        let pool = setup_pool().await;
        let z = create_zipcode(&pool, "Falls Church", "22042", 841, "Lacy Boulevard")
            .await
            .unwrap()
            .unwrap();
        let seg = claim_segment(&pool, z.id, 1, Some(100), "Lynda").await.unwrap();
        update_segment_fields(&pool, seg.id, Some(40), Some("In progress"), None, None)
            .await
            .unwrap()
            .unwrap();
        assert!(delete_segment(&pool, seg.id).await.unwrap());

        assert!(list_segments(&pool, z.id).await.unwrap().is_empty());
        assert!(find_zipcode(&pool, "22042").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let pool = setup_pool().await;
        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn ensure_schema_backfills_territory_column() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        sqlx::query(
            "CREATE TABLE zipcodes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                city        TEXT NOT NULL,
                zipcode     TEXT NOT NULL UNIQUE,
                total_pages INTEGER NOT NULL DEFAULT 0,
                created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO zipcodes (city, zipcode, total_pages) VALUES ('Old', '99999', 10)")
            .execute(&pool)
            .await
            .unwrap();

        ensure_schema(&pool).await.unwrap();

        let old = find_zipcode(&pool, "99999").await.unwrap().unwrap();
        assert_eq!(old.territory, "Lacy Boulevard");
    }

    #[tokio::test]
    async fn seed_upsert_updates_pages_and_keeps_territory() {
        let pool = setup_pool().await;
        let id = upsert_zipcode(&pool, "Woodbridge", "22192", 1549, Some("Woodbridge"))
            .await
            .unwrap();
        let again = upsert_zipcode(&pool, "Woodbridge", "22192", 1600, None)
            .await
            .unwrap();
        assert_eq!(id, again);

        let z = find_zipcode(&pool, "22192").await.unwrap().unwrap();
        assert_eq!(z.total_pages, 1600);
        assert_eq!(z.territory, "Woodbridge");
    }
}
