//! Storage backends behind the archive API.
//!
//! The backend is chosen once, when [`ArchiveContext::connect`] checks the
//! database, and stays fixed for the lifetime of the process.

pub mod memory;
pub mod postgres;

use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tokio::task::{self, JoinError};

use crate::config::StorageConfig;
use crate::db;
use crate::models::EmailPage;
use crate::seed;

pub use memory::MemoryStore;

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_LIMIT: i64 = 100;

    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page > 0 { page } else { Self::DEFAULT_PAGE },
            limit: if limit > 0 { limit } else { Self::DEFAULT_LIMIT },
        }
    }

    /// Coerce raw query values with [`leading_integer`]; anything missing,
    /// non-numeric or not positive falls back to the default.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let lenient = |value: Option<&str>| value.and_then(leading_integer).unwrap_or(0);
        Self::new(lenient(page), lenient(limit))
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Integer prefix of `raw`: leading whitespace, an optional sign, then a run
/// of ASCII digits. `"3.5"` gives 3, `"20px"` gives 20, `"abc"` gives `None`.
/// Digit runs beyond `i64` saturate.
pub fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    if digits.is_empty() {
        return None;
    }

    let magnitude = digits.bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Postgres,
    Memory,
}

/// Result of an administrative populate request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulateOutcome {
    Generated(usize),
    /// The database is authoritative; the seed binary must be used instead.
    Delegated,
}

#[derive(Debug)]
enum Backend {
    Postgres(PgPool),
    Memory(MemoryStore),
}

/// Storage handle shared by every request handler.
#[derive(Debug)]
pub struct ArchiveContext {
    backend: Backend,
}

impl ArchiveContext {
    /// Probe the configured database once and pick the backend for good.
    pub async fn connect(config: &StorageConfig) -> Self {
        let pool = db::lazy_pool(config);
        match db::check_connection(&pool).await {
            Ok(()) => {
                log::info!("connected to PostgreSQL at {}", config.display_target());
                Self::postgres(pool)
            }
            Err(err) => {
                log::warn!(
                    "PostgreSQL not available at {} ({}), using in-memory storage",
                    config.display_target(),
                    err
                );
                pool.close().await;
                Self::in_memory()
            }
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            backend: Backend::Postgres(pool),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self.backend {
            Backend::Postgres(_) => StorageMode::Postgres,
            Backend::Memory(_) => StorageMode::Memory,
        }
    }

    pub fn pool(&self) -> Option<&PgPool> {
        match &self.backend {
            Backend::Postgres(pool) => Some(pool),
            Backend::Memory(_) => None,
        }
    }

    pub async fn list_emails(&self, request: PageRequest) -> Result<EmailPage, sqlx::Error> {
        let (emails, total) = match &self.backend {
            Backend::Postgres(pool) => {
                postgres::page(pool, request.offset(), request.limit).await?
            }
            Backend::Memory(store) => store.page(request.offset(), request.limit),
        };

        Ok(EmailPage {
            emails,
            total,
            page: request.page,
            limit: request.limit,
        })
    }

    pub async fn get_body(&self, message_id: &str) -> Result<Option<String>, sqlx::Error> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::body(pool, message_id).await,
            Backend::Memory(store) => Ok(store.body(message_id)),
        }
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        match &self.backend {
            Backend::Postgres(pool) => postgres::count(pool).await,
            Backend::Memory(store) => Ok(store.count()),
        }
    }

    /// Regenerate the in-memory list with `count` emails anchored at `anchor`.
    ///
    /// The list is built on the blocking pool and published in one swap.
    pub async fn populate_in_memory(
        &self,
        count: u64,
        anchor: DateTime<Utc>,
    ) -> Result<PopulateOutcome, JoinError> {
        match &self.backend {
            Backend::Postgres(_) => Ok(PopulateOutcome::Delegated),
            Backend::Memory(store) => {
                let records =
                    task::spawn_blocking(move || seed::synthesize_records(count, anchor)).await?;
                Ok(PopulateOutcome::Generated(store.replace(records)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_bad_input() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("xyz")),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest::from_query(Some("0"), Some("-5")),
            PageRequest::default()
        );
        assert_eq!(
            PageRequest::from_query(Some(" 3 "), Some("25")),
            PageRequest::new(3, 25)
        );
    }

    #[test]
    fn page_request_takes_integer_prefix() {
        assert_eq!(
            PageRequest::from_query(Some("3.5"), Some("50.0")),
            PageRequest::new(3, 50)
        );
        assert_eq!(
            PageRequest::from_query(Some(" 7"), Some("20px")),
            PageRequest::new(7, 20)
        );
        assert_eq!(
            PageRequest::from_query(Some("-2.5"), Some(".5")),
            PageRequest::default()
        );
    }

    #[test]
    fn leading_integer_matches_prefix_rules() {
        assert_eq!(leading_integer("42.9"), Some(42));
        assert_eq!(leading_integer("  +8 apples"), Some(8));
        assert_eq!(leading_integer("-12"), Some(-12));
        assert_eq!(leading_integer("px20"), None);
        assert_eq!(leading_integer("-"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("99999999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn page_request_offset() {
        assert_eq!(PageRequest::new(1, 100).offset(), 0);
        assert_eq!(PageRequest::new(3, 100).offset(), 200);
        assert_eq!(PageRequest::new(i64::MAX, 100).offset(), i64::MAX);
    }

    #[tokio::test]
    async fn in_memory_context_serves_populated_records() {
        let context = ArchiveContext::in_memory();
        assert_eq!(context.mode(), StorageMode::Memory);
        assert_eq!(context.count().await.unwrap(), 0);

        let outcome = context
            .populate_in_memory(250, Utc::now())
            .await
            .expect("populate task");
        assert_eq!(outcome, PopulateOutcome::Generated(250));

        let page = context.list_emails(PageRequest::new(3, 100)).await.unwrap();
        assert_eq!(page.emails.len(), 50);
        assert_eq!(page.total, 250);
        assert_eq!(page.emails[0].id, 201);
    }
}
