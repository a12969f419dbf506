//! Identifier types shared by the database and API representations.

/// Our election IDs are integers.
pub type ElectionId = u32;
/// Our candidate IDs are integers, allocated in insertion order.
pub type CandidateId = u32;
/// Our school class IDs are integers.
pub type SchoolClassId = u32;

/// Selection cap used when an election is created without one.
pub const DEFAULT_MAX_VOTES: u32 = 3;
