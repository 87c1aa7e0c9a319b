//! Offline-first synchronization between the local cache and the remote API.
//!
//! A cycle always pushes before it pulls, so records created offline acquire
//! their server keys before the pull replaces the synchronized set.
//!
//! Merge policy per entity:
//! - animals and vaccines: full replace of the synchronized rows; rows with
//!   pending local edits are never touched by a pull, and an animal they
//!   still reference is re-queued for upload rather than removed
//! - vaccine catalog: merge, remote first with local entries winning on a
//!   case-insensitive name collision, then the union is uploaded
//! - dashboard KPIs: overwrite snapshot (see [`crate::dashboard`])

mod auto_sync;
mod coordinator;
mod error;
mod merge;

pub use auto_sync::{run_periodic, try_auto_sync};
pub use coordinator::{PushReport, SyncCoordinator, SyncReport, SyncState};
pub use error::SyncError;
pub use merge::merge_prefer_local;
