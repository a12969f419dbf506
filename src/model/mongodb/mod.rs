mod collection;
mod counter;
mod errors;
mod transaction;

pub use collection::{ensure_indexes_exist, Coll, MongoCollection};
pub use counter::{
    ensure_counters_exist, Counter, CANDIDATE_ID_COUNTER, ELECTION_ACTIVATION_COUNTER,
    ELECTION_ID_COUNTER, SCHOOL_CLASS_ID_COUNTER,
};
pub use errors::{is_duplicate_key_error, DUPLICATE_KEY};
pub use transaction::{run_transaction, MAX_TRANSACTION_ATTEMPTS};
