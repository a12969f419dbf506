//! Data types, split by where they live:
//!
//! - [`api`]: request and response bodies.
//! - [`common`]: types shared by both representations.
//! - [`db`]: stored documents, and the operations on them.
//! - [`mongodb`]: collection plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
