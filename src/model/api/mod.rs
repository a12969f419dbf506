//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Datetimes are serialised as RFC 3339 strings.
//! - Database-internal fields (object IDs, owning election IDs) are omitted.

pub mod admin;
pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod codes;
pub mod election;
pub mod school_class;
pub mod settings;

/// Trim an optional string, treating blank as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
