//! DB-compatible (e.g. de/serialisable) types, and the operations on them.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - Integer IDs are stored as `_id` and allocated from counters.
//! - Datetimes are serialised in MongoDB's own format.

pub mod admin;
pub mod candidate;
pub mod election;
pub mod school_class;
pub mod settings;
pub mod vote;
pub mod voting_code;
