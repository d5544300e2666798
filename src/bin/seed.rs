use chrono::{DateTime, Utc};
use clap::Parser;

use archive_server::config::StorageConfig;
use archive_server::db;
use archive_server::seed::{
    self, DEFAULT_BATCH_SIZE, DEFAULT_SEED_COUNT, SeedError, SeedPlan, SeedReport,
};

#[derive(Parser, Debug)]
#[command(
    name = "seed",
    about = "Fill the email archive table with synthetic emails"
)]
struct Args {
    /// Number of emails to generate.
    #[arg(long, default_value_t = DEFAULT_SEED_COUNT)]
    count: u64,

    /// Emails per INSERT statement.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Anchor instant (RFC 3339) for message ids and timestamps. Reusing the
    /// anchor of an earlier run makes the run a no-op.
    #[arg(long)]
    anchor: Option<DateTime<Utc>>,
}

async fn run(args: Args) -> Result<SeedReport, SeedError> {
    let config = StorageConfig::from_env();
    log::info!("connecting to PostgreSQL at {}", config.display_target());
    let pool = db::connect(&config).await?;

    log::info!("Creating table...");
    db::ensure_schema(&pool).await?;

    let mut plan = SeedPlan::new(args.count, args.batch_size);
    if let Some(anchor) = args.anchor {
        plan = plan.with_anchor(anchor);
    }

    log::info!(
        "Generating {} emails (anchor {})...",
        plan.total,
        plan.anchor.to_rfc3339()
    );
    let report = seed::populate(&pool, &plan).await;
    pool.close().await;
    report
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(report) => {
            log::info!(
                "Successfully populated {} emails! ({} inserted, {} already present, {} batches)",
                report.requested,
                report.inserted,
                report.skipped,
                report.batches
            );
        }
        Err(err) => {
            log::error!("Error populating: {}", err);
            std::process::exit(1);
        }
    }
}
