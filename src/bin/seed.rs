use anyhow::Result;
use az_tracker::{config, db};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Seed the tracker database with the known A-Z book territories. \
Zipcodes are upserted by their unique code; segments are only inserted for \
zipcodes that have none yet, so re-running is safe.")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

struct SeedSegment {
    page_start: i64,
    page_end: Option<i64>,
    owner: &'static str,
    stopped_at_page: Option<i64>,
    status: &'static str,
    notes: &'static str,
}

struct SeedZipcode {
    city: &'static str,
    zipcode: &'static str,
    total_pages: i64,
    /// None keeps the store default territory.
    territory: Option<&'static str>,
    segments: &'static [SeedSegment],
}

const fn seg(
    page_start: i64,
    page_end: Option<i64>,
    owner: &'static str,
    stopped_at_page: Option<i64>,
    status: &'static str,
    notes: &'static str,
) -> SeedSegment {
    SeedSegment {
        page_start,
        page_end,
        owner,
        stopped_at_page,
        status,
        notes,
    }
}

const AZ_LINK: &str = "A-Z Link: https://www.pwcva.gov/department/library/digital-library";
const CARD: &str = "Card Number: 23159002853825";

static DATA: &[SeedZipcode] = &[
    SeedZipcode {
        city: "Fairfax",
        zipcode: "22030",
        total_pages: 1518,
        territory: None,
        segments: &[
            seg(1, Some(200), "Boris", Some(200), "Completed", AZ_LINK),
            seg(201, Some(400), "Samantha", Some(400), "Completed", ""),
            seg(401, Some(600), "Kimberly", Some(600), "Completed", CARD),
            seg(601, Some(800), "Kimberly", Some(800), "Completed", ""),
            seg(801, Some(1000), "Stephanie", Some(1000), "Completed", ""),
            seg(1001, Some(1127), "Tabatha", Some(1064), "Completed", ""),
            seg(1051, Some(1200), "Kimberly", Some(1200), "Completed", ""),
            seg(1201, Some(1400), "Le'Kedra", Some(1390), "Completed", ""),
            seg(1401, Some(1518), "Faye", Some(1518), "Completed", ""),
        ],
    },
    SeedZipcode {
        city: "Fairfax",
        zipcode: "22031",
        total_pages: 943,
        territory: None,
        segments: &[
            seg(1, Some(400), "Mick", Some(400), "Completed", AZ_LINK),
            seg(401, Some(600), "Samantha", Some(501), "In progress", ""),
            seg(601, Some(800), "Kimberly", Some(800), "Completed", CARD),
            seg(801, Some(943), "Mick", Some(943), "Completed", ""),
        ],
    },
    SeedZipcode {
        city: "Annandale",
        zipcode: "22003",
        total_pages: 1461,
        territory: None,
        segments: &[
            seg(1, Some(200), "Boris", Some(200), "Completed", AZ_LINK),
            seg(201, Some(600), "Kimberly", Some(600), "Completed", ""),
            seg(601, Some(620), "Boris", Some(620), "Completed", CARD),
            seg(621, Some(720), "Samantha", Some(720), "Completed", ""),
            seg(721, Some(900), "Stephanie", Some(900), "Completed", ""),
            seg(901, Some(1000), "Samantha", Some(910), "In progress", ""),
            seg(1001, Some(1251), "Faye", None, "Completed", ""),
            seg(1252, Some(1461), "Kimberly", Some(1461), "Completed", ""),
        ],
    },
    SeedZipcode {
        city: "McLean",
        zipcode: "22102",
        total_pages: 890,
        territory: None,
        segments: &[
            seg(1, Some(250), "Blessing", None, "Not started", ""),
            seg(251, Some(400), "Sabrina", None, "Not started", ""),
            seg(401, Some(450), "Rikkiah", Some(406), "In progress", ""),
            seg(451, Some(460), "Le'Kedra", Some(460), "Completed", ""),
            seg(461, Some(570), "Boris", None, "Completed", ""),
            seg(713, Some(851), "Arafat", Some(732), "In progress", CARD),
        ],
    },
    SeedZipcode {
        city: "Arlington",
        zipcode: "22205",
        total_pages: 501,
        territory: None,
        segments: &[
            seg(1, Some(25), "Le'Kedra", None, "Not started", ""),
            seg(26, None, "Stephanie", None, "In progress", ""),
        ],
    },
    SeedZipcode {
        city: "Arlington",
        zipcode: "22209",
        total_pages: 450,
        territory: None,
        segments: &[],
    },
    SeedZipcode {
        city: "Alexandria",
        zipcode: "22304",
        total_pages: 1311,
        territory: None,
        segments: &[],
    },
    SeedZipcode {
        city: "Falls Church",
        zipcode: "22042",
        total_pages: 841,
        territory: None,
        segments: &[
            seg(1, Some(100), "Lynda", Some(40), "Not started", ""),
            seg(101, Some(108), "Samantha", Some(108), "Completed", ""),
            seg(109, Some(126), "Samantha", None, "Not started", ""),
        ],
    },
    SeedZipcode {
        city: "Woodbridge",
        zipcode: "22191",
        total_pages: 1656,
        territory: Some("Woodbridge"),
        segments: &[
            seg(1, Some(20), "Pamela", Some(20), "Completed", ""),
            seg(21, Some(200), "Mick", Some(200), "Completed", ""),
            seg(201, Some(250), "Pamela", Some(250), "Completed", ""),
            seg(901, Some(1000), "Mick", Some(1000), "Completed", ""),
            seg(1001, Some(1400), "Mick", Some(1400), "Completed", ""),
            seg(1401, Some(1656), "Mick", Some(1656), "Completed", ""),
        ],
    },
    SeedZipcode {
        city: "Woodbridge",
        zipcode: "22193",
        total_pages: 1974,
        territory: Some("Woodbridge"),
        segments: &[
            seg(1, Some(150), "Jadon", Some(150), "Completed", ""),
            seg(151, Some(301), "Jadon", Some(300), "Completed", ""),
            seg(302, Some(350), "Sabrina", Some(350), "Completed", ""),
            seg(401, Some(500), "Jadon", Some(415), "In progress", ""),
            seg(501, Some(502), "Rikkiah", None, "Completed", ""),
        ],
    },
    SeedZipcode {
        city: "Dumfries",
        zipcode: "22025",
        total_pages: 515,
        territory: Some("Woodbridge"),
        segments: &[seg(1, Some(200), "Mick", Some(200), "Completed", "")],
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/tracker.db", cfg.app.data_dir));
    let pool = db::init_pool(&database_url).await?;
    db::ensure_schema(&pool).await?;

    for z in DATA {
        let zipcode_id =
            db::upsert_zipcode(&pool, z.city, z.zipcode, z.total_pages, z.territory).await?;

        if db::segment_count(&pool, zipcode_id).await? > 0 {
            info!(city = z.city, zipcode = z.zipcode, "already seeded, skipping segments");
            continue;
        }

        for s in z.segments {
            db::insert_segment(
                &pool,
                zipcode_id,
                s.page_start,
                s.page_end,
                s.owner,
                s.stopped_at_page,
                s.status,
                s.notes,
            )
            .await?;
        }
        info!(
            city = z.city,
            zipcode = z.zipcode,
            segments = z.segments.len(),
            "seeded"
        );
    }

    Ok(())
}
