use std::time::Duration;

use moka::future::Cache;

use crate::services::cold_start::ColdStartSet;

/// Session key used when the caller does not identify its conversation
pub const DEFAULT_SESSION: &str = "default";

/// Cold-start sets offered per conversation.
///
/// The last set offered in a session is what that session's ratings are
/// matched against. Sessions never see each other's sets. Entries expire
/// after `idle` without reads or writes, and the store holds at most
/// `capacity` sessions.
#[derive(Clone)]
pub struct SessionStore {
    sets: Cache<String, ColdStartSet>,
}

impl SessionStore {
    pub fn new(capacity: u64, idle: Duration) -> Self {
        let sets = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .build();
        Self { sets }
    }

    /// Records the set offered to a session, replacing any previous one
    pub async fn remember(&self, session: &str, set: ColdStartSet) {
        self.sets.insert(session.to_string(), set).await;
    }

    /// Most recent set offered to a session
    pub async fn get(&self, session: &str) -> Option<ColdStartSet> {
        self.sets.get(session).await
    }

    /// Number of live sessions, after pending evictions are applied
    pub async fn session_count(&self) -> u64 {
        self.sets.run_pending_tasks().await;
        self.sets.entry_count()
    }
}
