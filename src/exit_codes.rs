//! Exit code constants for the casebook binary.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, unknown case)
//! - 2: Storage failure (data files unreadable or unwritable)
//! - 3: Server failure (bind or serve error)
//! - 4: Lock failure (case locked by another owner, or not owned)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or unknown case.
pub const USER_ERROR: i32 = 1;

/// Storage failure: a data file could not be read, parsed, or replaced.
pub const STORAGE_FAILURE: i32 = 2;

/// Server failure: the listener could not be bound or the server crashed.
pub const SERVER_FAILURE: i32 = 3;

/// Lock failure: the case is locked by another owner or the caller holds no lock.
pub const LOCK_FAILURE: i32 = 4;
