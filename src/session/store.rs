use super::clock::{Clock, SystemClock};
use super::record::{FileKind, SessionRecord, SessionSummary};
use super::sweeper::Sweeper;
use crate::analyser::dataset::Dataset;
use crate::error::{DataSummaryError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_MAX_SESSIONS: usize = 200;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Records held at once; creating past this evicts the least recently
    /// accessed record.
    pub max_sessions: usize,
    /// Idle time after which a record is gone.
    pub ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            ttl: DEFAULT_SESSION_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

struct EntryState {
    dataset: Arc<Dataset>,
    last_accessed_at: DateTime<Utc>,
    byte_size_estimate: usize,
    /// Set under this lock by every removal path. Holders of a cloned
    /// entry check it before touching anything else.
    removed: bool,
}

struct SessionEntry {
    id: Uuid,
    original_filename: String,
    file_kind: FileKind,
    created_at: DateTime<Utc>,
    state: Mutex<EntryState>,
}

impl SessionEntry {
    fn lock(&self) -> Result<MutexGuard<'_, EntryState>> {
        self.state.lock().map_err(|e| DataSummaryError::poisoned(&e))
    }

    fn record(&self, state: &EntryState) -> SessionRecord {
        SessionRecord {
            id: self.id.to_string(),
            dataset: Arc::clone(&state.dataset),
            original_filename: self.original_filename.clone(),
            file_kind: self.file_kind,
            created_at: self.created_at,
            last_accessed_at: state.last_accessed_at,
            byte_size_estimate: state.byte_size_estimate,
        }
    }
}

type Index = HashMap<Uuid, Arc<SessionEntry>>;

fn not_found(id: &str) -> DataSummaryError {
    DataSummaryError::SessionNotFound(id.to_owned())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).ok().ok_or_else(|| not_found(id))
}

/// State shared between the store handle and its sweeper thread.
///
/// Lock order is index, then entry. No path takes the index while holding
/// an entry lock, and at most one entry lock is held at a time.
pub(super) struct Shared {
    max_sessions: usize,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    index: RwLock<Index>,
}

impl Shared {
    fn read_index(&self) -> Result<RwLockReadGuard<'_, Index>> {
        self.index.read().map_err(|e| DataSummaryError::poisoned(&e))
    }

    fn write_index(&self) -> Result<RwLockWriteGuard<'_, Index>> {
        self.index.write().map_err(|e| DataSummaryError::poisoned(&e))
    }

    fn is_expired(&self, last_accessed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_accessed_at) >= self.ttl
    }

    /// Clones the entry out of the index so the index lock is released
    /// before the entry lock is taken.
    fn lookup(&self, id: &str) -> Result<Arc<SessionEntry>> {
        let key = parse_id(id)?;
        let index = self.read_index()?;
        index.get(&key).cloned().ok_or_else(|| not_found(id))
    }

    /// Locks a live entry and stamps it as accessed now.
    fn touch<'a>(
        &self,
        entry: &'a SessionEntry,
        id: &str,
    ) -> Result<MutexGuard<'a, EntryState>> {
        let mut state = entry.lock()?;
        let now = self.clock.now();
        if state.removed || self.is_expired(state.last_accessed_at, now) {
            return Err(not_found(id));
        }
        state.last_accessed_at = state.last_accessed_at.max(now);
        Ok(state)
    }

    fn least_recently_accessed(&self, index: &Index) -> Result<Option<Uuid>> {
        let mut oldest: Option<(DateTime<Utc>, Uuid)> = None;
        for entry in index.values() {
            let last = entry.lock()?.last_accessed_at;
            if oldest.is_none_or(|(at, _)| last < at) {
                oldest = Some((last, entry.id));
            }
        }
        Ok(oldest.map(|(_, id)| id))
    }

    pub(super) fn sweep(&self) -> Result<usize> {
        self.sweep_at(self.clock.now())
    }

    /// Removes every record idle for at least the TTL at `now`.
    ///
    /// Candidates are collected under the shared lock, then each is checked
    /// again under the exclusive lock: a record refreshed in between stays.
    fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let candidates: Vec<Uuid> = {
            let index = self.read_index()?;
            let mut expired = Vec::new();
            for entry in index.values() {
                if self.is_expired(entry.lock()?.last_accessed_at, now) {
                    expired.push(entry.id);
                }
            }
            expired
        };
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut index = self.write_index()?;
        let mut removed = 0;
        for id in candidates {
            let Some(entry) = index.get(&id).cloned() else {
                continue;
            };
            {
                let mut state = entry.lock()?;
                if state.removed || !self.is_expired(state.last_accessed_at, now) {
                    continue;
                }
                state.removed = true;
            }
            index.remove(&id);
            removed += 1;
            info!(session_id = %id, filename = %entry.original_filename, "Session expired");
        }
        debug!(removed, remaining = index.len(), "Sweep pass finished");
        Ok(removed)
    }
}

/// In-memory session table with LRU capacity eviction, idle expiry, and a
/// background sweeper thread that lives as long as the store.
pub struct SessionStore {
    shared: Arc<Shared>,
    config: StoreConfig,
    sweeper: Mutex<Option<Sweeper>>,
}

impl SessionStore {
    /// # Errors
    ///
    /// `InvalidInput` for a zero capacity, zero interval or out-of-range TTL;
    /// `Io` if the sweeper thread cannot be spawned.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Same as [`SessionStore::new`] with an injected time source.
    ///
    /// # Errors
    ///
    /// See [`SessionStore::new`].
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.max_sessions == 0 {
            return Err(DataSummaryError::InvalidInput(
                "max_sessions must be at least 1".to_owned(),
            ));
        }
        if config.cleanup_interval.is_zero() {
            return Err(DataSummaryError::InvalidInput(
                "cleanup interval must be non-zero".to_owned(),
            ));
        }
        let ttl = TimeDelta::from_std(config.ttl)
            .map_err(|e| DataSummaryError::InvalidInput(format!("session TTL out of range: {e}")))?;

        let shared = Arc::new(Shared {
            max_sessions: config.max_sessions,
            ttl,
            clock,
            index: RwLock::new(HashMap::new()),
        });
        let sweeper = Sweeper::spawn(Arc::clone(&shared), config.cleanup_interval)?;
        info!(
            max_sessions = config.max_sessions,
            ttl_secs = config.ttl.as_secs(),
            cleanup_interval_secs = config.cleanup_interval.as_secs(),
            "Session store started"
        );

        Ok(Self {
            shared,
            config,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Stores `dataset` under a fresh id. At capacity the least recently
    /// accessed record is evicted first; creation itself never fails for
    /// lack of room.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn create(
        &self,
        dataset: Dataset,
        filename: impl Into<String>,
        file_kind: FileKind,
    ) -> Result<SessionRecord> {
        let id = Uuid::new_v4();
        let now = self.shared.clock.now();
        let byte_size_estimate = dataset.estimated_bytes();
        let entry = Arc::new(SessionEntry {
            id,
            original_filename: filename.into(),
            file_kind,
            created_at: now,
            state: Mutex::new(EntryState {
                dataset: Arc::new(dataset),
                last_accessed_at: now,
                byte_size_estimate,
                removed: false,
            }),
        });
        let record = entry.record(&*entry.lock()?);

        let mut index = self.shared.write_index()?;
        while index.len() >= self.shared.max_sessions {
            let Some(victim) = self.shared.least_recently_accessed(&index)? else {
                break;
            };
            if let Some(evicted) = index.remove(&victim) {
                evicted.lock()?.removed = true;
                info!(
                    session_id = %victim,
                    filename = %evicted.original_filename,
                    "Session evicted to make room"
                );
            }
        }
        index.insert(id, entry);
        let total = index.len();
        drop(index);

        info!(
            session_id = %id,
            filename = %record.original_filename,
            rows = record.dataset.row_count(),
            columns = record.dataset.column_count(),
            total,
            "Session created"
        );
        Ok(record)
    }

    /// Returns a read view and refreshes the access time.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown, removed or idle-expired id.
    pub fn get(&self, id: &str) -> Result<SessionRecord> {
        let entry = self.shared.lookup(id)?;
        let state = self.shared.touch(&entry, id)?;
        Ok(entry.record(&state))
    }

    /// Swaps the stored dataset and refreshes the access time.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` for an unknown, removed or idle-expired id.
    pub fn replace(&self, id: &str, dataset: Dataset) -> Result<SessionRecord> {
        let entry = self.shared.lookup(id)?;
        let mut state = self.shared.touch(&entry, id)?;
        state.byte_size_estimate = dataset.estimated_bytes();
        state.dataset = Arc::new(dataset);
        let record = entry.record(&state);
        drop(state);

        info!(
            session_id = %id,
            rows = record.dataset.row_count(),
            "Session dataset replaced"
        );
        Ok(record)
    }

    /// Removes the record and returns its final view.
    ///
    /// # Errors
    ///
    /// `SessionNotFound` when absent. An idle-expired record is removed
    /// as well but still reported as not found.
    pub fn delete(&self, id: &str) -> Result<SessionRecord> {
        let key = parse_id(id)?;
        let entry = {
            let mut index = self.shared.write_index()?;
            index.remove(&key).ok_or_else(|| not_found(id))?
        };

        let mut state = entry.lock()?;
        let was_live =
            !state.removed && !self.shared.is_expired(state.last_accessed_at, self.shared.clock.now());
        state.removed = true;
        let record = entry.record(&state);
        drop(state);

        if !was_live {
            return Err(not_found(id));
        }
        info!(session_id = %id, filename = %record.original_filename, "Session deleted");
        Ok(record)
    }

    /// Live records ordered by creation time. Idle-expired records are
    /// skipped even before a sweep removes them. Listing does not count as
    /// an access.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn list(&self) -> Result<Vec<SessionSummary>> {
        let entries: Vec<Arc<SessionEntry>> = self.shared.read_index()?.values().cloned().collect();
        let now = self.shared.clock.now();

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let state = entry.lock()?;
            if state.removed || self.shared.is_expired(state.last_accessed_at, now) {
                continue;
            }
            summaries.push(entry.record(&state).summary());
        }
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(summaries)
    }

    /// Records currently held, including idle ones a sweep has not yet
    /// removed.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn len(&self) -> Result<usize> {
        Ok(self.shared.read_index()?.len())
    }

    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Runs one sweep pass against the store clock. Returns how many
    /// records were removed.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn sweep(&self) -> Result<usize> {
        self.shared.sweep()
    }

    /// Runs one sweep pass as if the time were `now`.
    ///
    /// # Errors
    ///
    /// `LockPoisoned` only.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        self.shared.sweep_at(now)
    }

    /// Stops the sweeper thread and waits for it. Records stay readable.
    pub fn close(&self) {
        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(sweeper) = sweeper {
            sweeper.stop();
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .field("sessions", &self.shared.read_index().map(|index| index.len()).ok())
            .finish_non_exhaustive()
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::indexing_slicing)]
    use super::*;
    use crate::analyser::dataset::Column;
    use crate::session::clock::ManualClock;

    fn hour() -> TimeDelta {
        TimeDelta::hours(1)
    }

    fn dataset(rows: i64) -> Dataset {
        Dataset::new(vec![Column::integer("n", (0..rows).map(Some).collect())]).unwrap()
    }

    fn store_with(max_sessions: usize) -> (SessionStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let config = StoreConfig {
            max_sessions,
            ..StoreConfig::default()
        };
        let store = SessionStore::with_clock(config, Arc::clone(&clock) as Arc<dyn Clock>).unwrap();
        (store, clock)
    }

    #[test]
    fn test_create_and_get() {
        let (store, clock) = store_with(10);
        let created = store.create(dataset(3), "a.csv", FileKind::Csv).unwrap();
        assert_eq!(created.created_at, created.last_accessed_at);

        clock.advance(TimeDelta::minutes(5));
        let fetched = store.get(&created.id).unwrap();
        assert_eq!(fetched.dataset.row_count(), 3);
        assert_eq!(fetched.original_filename, "a.csv");
        assert_eq!(fetched.last_accessed_at, created.created_at + TimeDelta::minutes(5));
    }

    #[test]
    fn test_unknown_and_malformed_ids() {
        let (store, _clock) = store_with(10);
        assert!(matches!(
            store.get("not-a-uuid"),
            Err(DataSummaryError::SessionNotFound(_))
        ));
        let random = Uuid::new_v4().to_string();
        assert!(store.get(&random).unwrap_err().is_not_found());
    }

    #[test]
    fn test_capacity_evicts_least_recently_accessed() {
        let (store, clock) = store_with(3);
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(store.create(dataset(1), format!("{i}.csv"), FileKind::Csv).unwrap().id);
            clock.advance(TimeDelta::seconds(1));
        }
        // Touch the oldest so the second becomes the LRU record.
        store.get(&ids[0]).unwrap();
        clock.advance(TimeDelta::seconds(1));

        let newest = store.create(dataset(1), "3.csv", FileKind::Csv).unwrap();
        assert_eq!(store.len().unwrap(), 3);
        assert!(store.get(&ids[1]).is_err(), "LRU record evicted");
        assert!(store.get(&ids[0]).is_ok());
        assert!(store.get(&ids[2]).is_ok());
        assert!(store.get(&newest.id).is_ok());
    }

    #[test]
    fn test_default_capacity_holds_two_hundred() {
        let (store, clock) = store_with(DEFAULT_MAX_SESSIONS);
        let first = store.create(dataset(1), "first.csv", FileKind::Csv).unwrap();
        for _ in 1..DEFAULT_MAX_SESSIONS {
            clock.advance(TimeDelta::milliseconds(1));
            store.create(dataset(1), "x.csv", FileKind::Csv).unwrap();
        }
        assert_eq!(store.len().unwrap(), DEFAULT_MAX_SESSIONS);

        clock.advance(TimeDelta::milliseconds(1));
        store.create(dataset(1), "overflow.csv", FileKind::Csv).unwrap();
        assert_eq!(store.len().unwrap(), DEFAULT_MAX_SESSIONS, "exactly one evicted");
        assert!(store.get(&first.id).is_err());
    }

    #[test]
    fn test_sweep_respects_ttl_boundary() {
        let (store, _clock) = store_with(10);
        let created = store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        let t = created.last_accessed_at;

        assert_eq!(store.sweep_at(t + hour() - TimeDelta::seconds(1)).unwrap(), 0);
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.sweep_at(t + hour()).unwrap(), 1, "idle for exactly the TTL");
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_get_refreshes_access_time() {
        let (store, clock) = store_with(10);
        let created = store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        let t0 = created.last_accessed_at;

        clock.advance(TimeDelta::minutes(30));
        store.get(&created.id).unwrap();
        assert_eq!(store.sweep_at(t0 + hour() + TimeDelta::seconds(1)).unwrap(), 0);
        assert!(store.get(&created.id).is_ok());
    }

    #[test]
    fn test_idle_record_is_hidden_before_sweep() {
        let (store, clock) = store_with(10);
        let created = store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        clock.advance(hour());

        assert!(store.get(&created.id).is_err());
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.len().unwrap(), 1, "still held until swept");
        assert_eq!(store.sweep().unwrap(), 1);
        assert!(store.delete(&created.id).is_err());
    }

    #[test]
    fn test_delete_twice() {
        let (store, _clock) = store_with(10);
        let created = store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        let deleted = store.delete(&created.id).unwrap();
        assert_eq!(deleted.original_filename, "a.csv");
        assert!(matches!(
            store.delete(&created.id),
            Err(DataSummaryError::SessionNotFound(_))
        ));
        assert!(store.get(&created.id).is_err());
    }

    #[test]
    fn test_replace_keeps_old_snapshots_intact() {
        let (store, _clock) = store_with(10);
        let created = store.create(dataset(3), "a.csv", FileKind::Csv).unwrap();
        let before = store.get(&created.id).unwrap();

        let after = store.replace(&created.id, dataset(1)).unwrap();
        assert_eq!(after.dataset.row_count(), 1);
        assert_eq!(before.dataset.row_count(), 3, "earlier view unaffected");
        assert_eq!(store.get(&created.id).unwrap().dataset.row_count(), 1);
        assert!(store.replace(&Uuid::new_v4().to_string(), dataset(1)).is_err());
    }

    #[test]
    fn test_list_ordered_by_creation() {
        let (store, clock) = store_with(10);
        let a = store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        clock.advance(TimeDelta::seconds(1));
        let b = store.create(dataset(2), "b.xlsx", FileKind::Xlsx).unwrap();

        store.get(&a.id).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].session_id, a.id);
        assert_eq!(listed[1].session_id, b.id);
        assert_eq!(listed[1].row_count, 2);
        assert_eq!(listed[1].file_kind, FileKind::Xlsx);
    }

    #[test]
    fn test_sweeper_thread_removes_expired_records() {
        let clock = Arc::new(ManualClock::default());
        let config = StoreConfig {
            cleanup_interval: Duration::from_millis(10),
            ..StoreConfig::default()
        };
        let store = SessionStore::with_clock(config, Arc::clone(&clock) as Arc<dyn Clock>).unwrap();
        store.create(dataset(1), "a.csv", FileKind::Csv).unwrap();
        clock.advance(hour());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !store.is_empty().unwrap() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(store.is_empty().unwrap(), "sweeper should have run");
        store.close();
        store.close();
    }

    #[test]
    fn test_rejects_bad_config() {
        let zero = StoreConfig {
            max_sessions: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(
            SessionStore::new(zero),
            Err(DataSummaryError::InvalidInput(_))
        ));
        let no_interval = StoreConfig {
            cleanup_interval: Duration::ZERO,
            ..StoreConfig::default()
        };
        assert!(SessionStore::new(no_interval).is_err());
    }
}
