//! Lock subsystem for casebook.
//!
//! A lock is a soft, time-bounded claim by one owner to edit one case. The
//! lock table maps case ids to locks; absence means the case is free.
//!
//! # Rules
//!
//! - At most one live lock per case.
//! - A lock is dead once `now >= expires_at`, whether or not it has been
//!   purged yet. Dead locks behave exactly like absent ones.
//! - `acquire` by someone else while a live lock exists is a `Conflict`.
//!   `acquire` by the holder mints a new lock with a new id.
//! - `renew` keeps the lock id and pushes `expires_at` to `now + ttl`.
//! - `release` of another owner's live lock is `Forbidden`; releasing a free
//!   case succeeds.
//! - Entries without an owner never conflict with anyone.
//!
//! # Persistence
//!
//! Every change is written through to a [`SnapshotStore`](crate::store::SnapshotStore)
//! as a full-table replace, then published to subscribers through
//! [`Fanout`](crate::fanout::Fanout).

mod guard;
mod manager;
mod sweeper;
mod types;


pub use manager::LockManager;
pub use sweeper::Sweeper;
pub use types::{Lock, LockTable, Owner};
