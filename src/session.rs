//! Session-scoped dataset cache.
//!
//! A [`SessionStore`] keeps uploaded datasets in memory under generated ids.
//! It holds at most `max_sessions` records, evicting the least recently
//! accessed one to make room, and forgets any record idle for the TTL. A
//! sweeper thread owned by the store removes idle records on a fixed
//! interval; reads already treat them as gone before that happens.
//!
//! ```no_run
//! use data_summary::analyser::dataset::{Column, Dataset};
//! use data_summary::session::{FileKind, SessionStore, StoreConfig};
//!
//! let store = SessionStore::new(StoreConfig::default())?;
//! let ds = Dataset::new(vec![Column::integer("n", vec![Some(1), None])])?;
//! let record = store.create(ds, "numbers.csv", FileKind::Csv)?;
//! assert_eq!(store.get(&record.id)?.dataset.row_count(), 2);
//! store.close();
//! # Ok::<(), data_summary::error::DataSummaryError>(())
//! ```
//!
//! Each record has its own lock, so traffic on different sessions never
//! contends beyond the brief index lookup, and analysis always runs on an
//! `Arc<Dataset>` snapshot with no lock held.

mod clock;
mod record;
mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use record::{FileKind, SessionRecord, SessionSummary};
pub use store::{
    DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL, SessionStore, StoreConfig,
};
