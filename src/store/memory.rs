use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::models::{EmailRecord, EmailSummary};

/// Process-local email list used when PostgreSQL is unreachable.
///
/// Readers work on a snapshot taken with `ArcSwap::load_full()`; `replace`
/// publishes a fully built list with a single pointer swap, so no reader ever
/// sees a partially populated list.
#[derive(Debug, Default)]
pub struct MemoryStore {
    emails: ArcSwap<Vec<EmailRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Vec<EmailRecord>> {
        self.emails.load_full()
    }

    /// Swap in `emails` wholesale, returning the new length.
    pub fn replace(&self, emails: Vec<EmailRecord>) -> usize {
        let len = emails.len();
        self.emails.store(Arc::new(emails));
        len
    }

    pub fn count(&self) -> i64 {
        self.emails.load().len() as i64
    }

    /// Summaries for `[offset, offset + limit)` in id order.
    pub fn page(&self, offset: i64, limit: i64) -> (Vec<EmailSummary>, i64) {
        let emails = self.snapshot();
        let start = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let page = emails
            .iter()
            .skip(start)
            .take(take)
            .map(EmailSummary::from)
            .collect();
        (page, emails.len() as i64)
    }

    pub fn body(&self, message_id: &str) -> Option<String> {
        self.emails
            .load()
            .iter()
            .find(|email| email.message_id == message_id)
            .map(|email| email.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::synthesize_records;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn store_with(count: u64) -> MemoryStore {
        let store = MemoryStore::new();
        let anchor = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        store.replace(synthesize_records(count, anchor));
        store
    }

    #[test]
    fn starts_empty() {
        let store = MemoryStore::new();
        assert_eq!(store.count(), 0);
        assert!(store.page(0, 100).0.is_empty());
    }

    #[test]
    fn page_slices_in_id_order() {
        let store = store_with(250);

        let (first, total) = store.page(0, 100);
        assert_eq!(total, 250);
        assert_eq!(first.len(), 100);
        assert_eq!(first[0].id, 1);
        assert_eq!(first[99].id, 100);

        let (last, _) = store.page(200, 100);
        assert_eq!(last.len(), 50);
        assert_eq!(last[49].id, 250);

        let (beyond, total) = store.page(300, 100);
        assert!(beyond.is_empty());
        assert_eq!(total, 250);
    }

    #[test]
    fn body_lookup_is_exact() {
        let store = store_with(3);
        let target = store.snapshot()[1].clone();

        assert_eq!(store.body(&target.message_id), Some(target.body));
        assert_eq!(store.body("<missing@example.com>"), None);
        assert_eq!(store.body(&target.message_id[1..]), None);
    }

    #[test]
    fn replace_discards_previous_list() {
        let store = store_with(10);
        assert_eq!(store.replace(synthesize_records(4, Utc::now())), 4);
        assert_eq!(store.count(), 4);
    }

    #[test]
    fn concurrent_readers_never_observe_partial_list() {
        const NEW_COUNT: u64 = 5_000;
        let store = MemoryStore::new();
        let done = AtomicBool::new(false);
        let new_list = synthesize_records(NEW_COUNT, Utc::now());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::Acquire) {
                        let len = store.snapshot().len() as u64;
                        assert!(len == 0 || len == NEW_COUNT, "observed partial list of {len}");
                        let count = store.count() as u64;
                        assert!(count == 0 || count == NEW_COUNT);
                    }
                });
            }

            store.replace(new_list);
            done.store(true, Ordering::Release);
        });

        assert_eq!(store.count() as u64, NEW_COUNT);
    }
}
