use std::time::Duration;

use log::{debug, warn};
use mongodb::{
    error::{Error as DbError, TRANSIENT_TRANSACTION_ERROR, UNKNOWN_TRANSACTION_COMMIT_RESULT},
    options::{Acknowledgment, ReadConcern, TransactionOptions, WriteConcern},
    Client, ClientSession,
};
use rocket::futures::future::BoxFuture;
use rocket::tokio::time::sleep;

/// Upper bound on how many times a transaction (including its commit) is attempted
/// before a transient failure is surfaced to the caller.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 8;

/// Pause before the given retry, growing linearly so a conflicting transaction
/// has time to commit.
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(10 * u64::from(attempt))
}

/// Transactions read from a single snapshot and commit with majority write concern,
/// so two transactions that write the same document cannot both commit.
fn transaction_options() -> TransactionOptions {
    TransactionOptions::builder()
        .read_concern(ReadConcern::snapshot())
        .write_concern(WriteConcern::builder().w(Acknowledgment::Majority).build())
        .build()
}

/// Run `body` inside a transaction, retrying on transient errors.
///
/// The body receives the session and a mutable borrow of `context`; anything the
/// transaction needs (collections, inputs) should live in the context so the
/// returned future can borrow it. The body may run several times, so it must
/// not have side effects outside the database.
///
/// A body that returns `Ok` has its transaction committed even when it made no
/// writes; that is how a typed rejection is reported without an error.
pub async fn run_transaction<C, R, F>(
    client: &Client,
    mut context: C,
    mut body: F,
) -> Result<R, DbError>
where
    C: Send,
    R: Send,
    F: for<'a> FnMut(&'a mut ClientSession, &'a mut C) -> BoxFuture<'a, Result<R, DbError>>
        + Send,
{
    let mut session = client.start_session(None).await?;
    let mut attempt = 0;

    'transaction: loop {
        attempt += 1;
        session.start_transaction(transaction_options()).await?;

        let value = match body(&mut session, &mut context).await {
            Ok(value) => value,
            Err(e) => {
                // The server may have already aborted it; either way it is over.
                let _ = session.abort_transaction().await;
                if e.contains_label(TRANSIENT_TRANSACTION_ERROR) && attempt < MAX_TRANSACTION_ATTEMPTS {
                    warn!("Transaction attempt {attempt} hit a transient error, retrying: {e}");
                    sleep(backoff(attempt)).await;
                    continue 'transaction;
                }
                return Err(e);
            }
        };

        loop {
            match session.commit_transaction().await {
                Ok(()) => {
                    debug!("Transaction committed after {attempt} attempt(s)");
                    return Ok(value);
                }
                Err(e)
                    if e.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    attempt += 1;
                    warn!("Transaction commit result unknown, retrying commit: {e}");
                }
                Err(e)
                    if e.contains_label(TRANSIENT_TRANSACTION_ERROR)
                        && attempt < MAX_TRANSACTION_ATTEMPTS =>
                {
                    warn!("Transaction commit hit a transient error, retrying: {e}");
                    sleep(backoff(attempt)).await;
                    continue 'transaction;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
