use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        class_name::compare_class_labels,
        election::{ElectionId, SchoolClassId},
    },
    db::{election::Election, school_class::SchoolClass, voting_code::VotingCode},
};

fn default_count() -> usize {
    50
}

/// Request for a batch of unlabelled codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateCodesRequest {
    #[serde(default = "default_count")]
    pub count: usize,
}

/// How many codes a generation request produced. `generated` falls short of
/// `requested` only when the collision budget ran out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generated: usize,
    pub requested: usize,
}

/// A voting code as shown to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescription {
    pub code: String,
    pub is_used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub class_name: Option<String>,
}

impl From<VotingCode> for CodeDescription {
    fn from(code: VotingCode) -> Self {
        Self {
            used_at: code.used_at.map(|at| at.to_chrono()),
            is_used: code.code.is_used,
            class_name: code.code.class_name,
            code: code.code.code,
        }
    }
}

/// A class and how many codes it has so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCodeCount {
    pub id: SchoolClassId,
    pub name: String,
    pub student_count: u32,
    pub codes: u64,
}

impl ClassCodeCount {
    pub fn new(class: SchoolClass, codes: u64) -> Self {
        Self {
            id: class.id,
            name: class.class.name,
            student_count: class.class.student_count,
            codes,
        }
    }
}

/// Every code of an election, plus per-class provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeOverview {
    /// In creation order.
    pub codes: Vec<CodeDescription>,
    pub used: usize,
    /// In natural class order.
    pub classes: Vec<ClassCodeCount>,
}

/// One printable code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSheetEntry {
    pub code: String,
    /// Link that opens the ballot directly.
    pub url: String,
}

/// The codes printed for one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSheetGroup {
    /// `None` for codes generated without a class.
    pub class_name: Option<String>,
    pub codes: Vec<CodeSheetEntry>,
}

/// The data a printable code sheet is rendered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSheet {
    pub election_id: ElectionId,
    pub name: String,
    pub year: i32,
    /// In natural class order, unlabelled codes last.
    pub groups: Vec<CodeSheetGroup>,
}

impl CodeSheet {
    /// Group codes by class label. `codes` is expected in creation order,
    /// which is kept within each group.
    pub fn new(election: Election, mut codes: Vec<VotingCode>, base_url: &str) -> Self {
        codes.sort_by(|a, b| compare_class_labels(a.class_name.as_deref(), b.class_name.as_deref()));

        let base_url = base_url.trim_end_matches('/');
        let mut groups: Vec<CodeSheetGroup> = Vec::new();
        for code in codes {
            let entry = CodeSheetEntry {
                url: format!("{base_url}/vote/{}", code.code.code),
                code: code.code.code,
            };
            match groups.last_mut() {
                Some(group) if group.class_name == code.code.class_name => group.codes.push(entry),
                _ => groups.push(CodeSheetGroup {
                    class_name: code.code.class_name,
                    codes: vec![entry],
                }),
            }
        }

        Self {
            election_id: election.id,
            name: election.election.name,
            year: election.election.year,
            groups,
        }
    }
}
