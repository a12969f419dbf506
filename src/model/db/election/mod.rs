mod activation;
mod base;
mod cascade;

pub use activation::{toggle_election, ToggleOutcome};
pub use base::{Election, ElectionCore};
pub use cascade::delete_election;
