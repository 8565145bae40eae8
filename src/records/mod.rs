//! Case records.
//!
//! The record list is a plain collaborator of the lock subsystem: a flat
//! list of JSON objects keyed by an integer-like `caseId`, stored whole in
//! one file. The only schema rule is a non-blank `name` on creation.

mod book;
mod types;


pub use book::RecordBook;
pub use types::{CaseView, Record, USER_ID_FIELD, next_case_id};
