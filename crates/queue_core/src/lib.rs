//! Live synchronization for a course help queue page.
//!
//! Push events and backfilled snapshots enter the [`store`] through the
//! [`engine::ReconciliationEngine`] handlers; after each mutation the engine
//! re-derives counts and role-dependent state ([`derive`]) and projects it onto
//! the presentation [`projector::Surface`].

pub mod backfill;
pub mod derive;
pub mod engine;
pub mod error;
pub mod projector;
pub mod store;
pub mod transport;

pub use backfill::{run_backfill, BackfillReport, BackfillSource, HttpBackfill};
pub use derive::DerivedState;
pub use engine::{ReconciliationEngine, UserIntent};
pub use error::SyncError;
pub use projector::{Surface, TemplateSet};
pub use transport::{PushConnection, TransportMessage};

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod fixtures;
