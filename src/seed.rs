//! Synthetic email generation and batched seeding.
//!
//! Every field of a synthesized email is a pure function of its 1-based
//! index, the size of the run and the run anchor. The anchor is the wall-clock
//! instant captured once when a run starts; it is embedded in message ids and
//! ends the received-at sequence, so re-running with the same anchor hits the
//! unique constraint instead of duplicating rows.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use sqlx::PgPool;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::models::{EmailRecord, NewEmail};

pub const DEFAULT_BATCH_SIZE: u64 = 1000;
pub const DEFAULT_SEED_COUNT: u64 = 100_000;

const DOMAINS: [&str; 4] = ["example.com", "test.com", "demo.org", "sample.net"];

const SUBJECTS: [&str; 8] = [
    "Meeting Tomorrow",
    "Project Update",
    "Invoice #",
    "Weekly Report",
    "Action Required",
    "Follow Up",
    "Reminder",
    "Thank You",
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Current time truncated to milliseconds, the precision carried by message
/// ids and rendered bodies.
pub fn current_anchor() -> DateTime<Utc> {
    let millis = Utc::now().timestamp_millis();
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Build the email at `index` (1-based) of a run of `total` emails.
pub fn synthesize(index: u64, total: u64, anchor: DateTime<Utc>) -> NewEmail {
    let domain = DOMAINS[(index % DOMAINS.len() as u64) as usize];
    let subject = SUBJECTS[(index % SUBJECTS.len() as u64) as usize];

    let minutes_back = total.saturating_sub(index).min(i64::MAX as u64) as i64;
    let received_at = anchor - Duration::minutes(minutes_back);
    let received_label = received_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    NewEmail {
        message_id: format!("<msg-{}-{}@{}>", index, anchor.timestamp_millis(), domain),
        from_address: format!("user{index}@{domain}"),
        to_address: format!("recipient{index}@{domain}"),
        subject: format!("{subject} {index}"),
        received_at,
        body: format!(
            "This is the body of email {index}.\n\nIt contains some content that will be stored on disk.\n\nGenerated at {received_label}"
        ),
    }
}

/// Synthesize a complete run as records whose ids equal their indices.
pub fn synthesize_records(total: u64, anchor: DateTime<Utc>) -> Vec<EmailRecord> {
    (1..=total)
        .map(|index| synthesize(index, total, anchor).into_record(index as i64))
        .collect()
}

/// Split `[1, total]` into consecutive ranges of at most `batch_size` indices.
pub fn batch_ranges(total: u64, batch_size: u64) -> impl Iterator<Item = RangeInclusive<u64>> {
    let step = batch_size.max(1);
    (0..total.div_ceil(step)).map(move |batch| {
        let start = batch * step + 1;
        let end = (start + step - 1).min(total);
        start..=end
    })
}

/// Parameters for one seeding run.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub total: u64,
    pub batch_size: u64,
    pub anchor: DateTime<Utc>,
}

impl SeedPlan {
    pub fn new(total: u64, batch_size: u64) -> Self {
        Self {
            total,
            batch_size,
            anchor: current_anchor(),
        }
    }

    pub fn with_anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }
}

/// Outcome of a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub requested: u64,
    pub inserted: u64,
    /// Rows dropped by `ON CONFLICT DO NOTHING`.
    pub skipped: u64,
    pub batches: u64,
}

/// Column-wise batch ready for an `UNNEST` insert.
#[derive(Debug, Default)]
struct EmailColumns {
    message_ids: Vec<String>,
    from_addresses: Vec<String>,
    to_addresses: Vec<String>,
    subjects: Vec<String>,
    received_ats: Vec<DateTime<Utc>>,
    bodies: Vec<String>,
}

impl EmailColumns {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            message_ids: Vec::with_capacity(capacity),
            from_addresses: Vec::with_capacity(capacity),
            to_addresses: Vec::with_capacity(capacity),
            subjects: Vec::with_capacity(capacity),
            received_ats: Vec::with_capacity(capacity),
            bodies: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, email: NewEmail) {
        self.message_ids.push(email.message_id);
        self.from_addresses.push(email.from_address);
        self.to_addresses.push(email.to_address);
        self.subjects.push(email.subject);
        self.received_ats.push(email.received_at);
        self.bodies.push(email.body);
    }

    fn len(&self) -> usize {
        self.message_ids.len()
    }
}

/// Bulk insert one batch, skipping rows whose message id already exists.
async fn insert_batch(pool: &PgPool, columns: &EmailColumns) -> Result<u64, sqlx::Error> {
    if columns.message_ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query(
        r#"INSERT INTO emails (
            message_id, from_address, to_address, subject, received_at, body
           )
           SELECT * FROM UNNEST(
               $1::text[], $2::text[], $3::text[], $4::text[], $5::timestamptz[], $6::text[]
           )
           ON CONFLICT (message_id) DO NOTHING"#,
    )
    .bind(&columns.message_ids)
    .bind(&columns.from_addresses)
    .bind(&columns.to_addresses)
    .bind(&columns.subjects)
    .bind(&columns.received_ats)
    .bind(&columns.bodies)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Seed `plan.total` emails in batches of `plan.batch_size`.
///
/// The first failing batch aborts the run; batches already written stay.
pub async fn populate(pool: &PgPool, plan: &SeedPlan) -> Result<SeedReport, SeedError> {
    if plan.batch_size == 0 {
        return Err(SeedError::InvalidBatchSize);
    }

    let mut report = SeedReport {
        requested: plan.total,
        ..SeedReport::default()
    };
    let mut processed = 0u64;

    for range in batch_ranges(plan.total, plan.batch_size) {
        let mut columns = EmailColumns::with_capacity((range.end() - range.start() + 1) as usize);
        for index in range {
            columns.push(synthesize(index, plan.total, plan.anchor));
        }

        let attempted = columns.len() as u64;
        let inserted = insert_batch(pool, &columns).await?;
        if inserted < attempted {
            log::debug!(
                "populate: {} of {} emails skipped as duplicates",
                attempted - inserted,
                attempted
            );
        }

        processed += attempted;
        report.inserted += inserted;
        report.skipped += attempted - inserted;
        report.batches += 1;
        log::info!("Inserted {}/{} emails...", processed, plan.total);
    }

    Ok(report)
}
