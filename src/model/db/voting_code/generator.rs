use std::future::Future;

use log::{debug, info, warn};
use mongodb::{bson::doc, Database};
use rand::Rng;
use rocket::futures::TryStreamExt;

use crate::error::Result;
use crate::model::{
    api::codes::GenerationReport,
    common::election::ElectionId,
    db::school_class::SchoolClass,
    mongodb::{is_duplicate_key_error, Coll},
};

use super::NewVotingCode;

/// Mixed-case letters and digits.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const CODE_LENGTH: usize = 8;
/// Random draws allowed per requested code before giving up on the rest of a batch.
pub const ATTEMPTS_PER_CODE: usize = 3;
/// Upper bound on a single plain generation request.
pub const MAX_CODES_PER_REQUEST: usize = 2000;

/// Draws random codes over a fixed alphabet.
#[derive(Debug, Clone, Copy)]
pub struct CodeGenerator {
    alphabet: &'static [u8],
    length: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(CODE_ALPHABET, CODE_LENGTH)
    }
}

impl CodeGenerator {
    pub fn new(alphabet: &'static [u8], length: usize) -> Self {
        Self { alphabet, length }
    }

    /// Draw a single candidate code.
    pub fn draw(&self, rng: &mut impl Rng) -> String {
        (0..self.length)
            .map(|_| char::from(self.alphabet[rng.gen_range(0..self.alphabet.len())]))
            .collect()
    }

    /// Draw codes and offer each to `claim` until `count` have been accepted or
    /// `count * ATTEMPTS_PER_CODE` draws have been made.
    ///
    /// `claim` returns `Ok(false)` when the code is already taken. The accepted
    /// codes are returned; there may be fewer than `count` of them.
    pub async fn fill<F, Fut>(&self, count: usize, mut claim: F) -> Result<Vec<String>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let budget = count.saturating_mul(ATTEMPTS_PER_CODE);
        let mut codes = Vec::with_capacity(count);
        let mut attempts = 0;
        while codes.len() < count && attempts < budget {
            attempts += 1;
            // `ThreadRng` is a CSPRNG, but not `Send`; keep it out of the await.
            let code = {
                let mut rng = rand::thread_rng();
                self.draw(&mut rng)
            };
            if claim(code.clone()).await? {
                codes.push(code);
            } else {
                debug!("Generated code collided, drawing another");
            }
        }
        Ok(codes)
    }
}

/// How many codes a class still needs.
pub fn codes_needed(student_count: u32, existing: u64) -> usize {
    u64::from(student_count).saturating_sub(existing) as usize
}

/// Insert a code, relying on the unique index to refuse duplicates.
async fn claim_code(codes: &Coll<NewVotingCode>, code: NewVotingCode) -> Result<bool> {
    match codes.insert_one(code, None).await {
        Ok(_) => Ok(true),
        Err(e) if is_duplicate_key_error(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Generate up to `count` codes, optionally labelled with a class.
async fn fill_election(
    codes: &Coll<NewVotingCode>,
    election_id: ElectionId,
    count: usize,
    class_name: Option<&str>,
) -> Result<usize> {
    let generated = CodeGenerator::default()
        .fill(count, |code| {
            let codes = codes.clone();
            let code = NewVotingCode::new(election_id, code, class_name.map(str::to_owned));
            async move { claim_code(&codes, code).await }
        })
        .await?;
    Ok(generated.len())
}

/// Generate `count` unlabelled codes for an election, capped at
/// [`MAX_CODES_PER_REQUEST`].
pub async fn generate_codes(
    db: &Database,
    election_id: ElectionId,
    count: usize,
) -> Result<GenerationReport> {
    let requested = count.min(MAX_CODES_PER_REQUEST);
    let generated = fill_election(&Coll::from_db(db), election_id, requested, None).await?;
    let report = GenerationReport {
        generated,
        requested,
    };
    report.log(election_id);
    Ok(report)
}

/// Top up every class of an election to its student count.
pub async fn generate_for_classes(db: &Database, election_id: ElectionId) -> Result<GenerationReport> {
    let codes = Coll::<NewVotingCode>::from_db(db);
    let mut classes: Vec<SchoolClass> = Coll::<SchoolClass>::from_db(db)
        .find(doc! { "election_id": election_id }, None)
        .await?
        .try_collect()
        .await?;
    SchoolClass::sort(&mut classes);

    let mut report = GenerationReport::default();
    for class in classes {
        let existing = codes
            .count_documents(
                doc! { "election_id": election_id, "class_name": &class.name },
                None,
            )
            .await?;
        let needed = codes_needed(class.student_count, existing);
        if needed == 0 {
            continue;
        }
        report.requested += needed;
        report.generated += fill_election(&codes, election_id, needed, Some(&class.name)).await?;
    }
    report.log(election_id);
    Ok(report)
}

impl GenerationReport {
    fn log(&self, election_id: ElectionId) {
        if self.generated < self.requested {
            warn!(
                "Generated only {} of {} codes for election {election_id}",
                self.generated, self.requested
            );
        } else {
            info!("Generated {} codes for election {election_id}", self.generated);
        }
    }
}
