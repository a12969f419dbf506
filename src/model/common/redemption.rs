use rocket::http::Status;
use serde::Serialize;
use thiserror::Error;

/// Why a voting code could not be redeemed.
///
/// Variants are declared in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedemptionRejection {
    #[error("This voting code does not exist")]
    InvalidCode,
    #[error("This voting code has already been used")]
    AlreadyUsed,
    #[error("This election is not currently open for voting")]
    ElectionInactive,
    #[error("Please choose at least one candidate")]
    EmptySelection,
    #[error("You may choose at most {max} candidates")]
    TooManySelections { max: u32 },
    #[error("The ballot contains candidates that do not belong to this election")]
    InvalidCandidate,
}

impl RedemptionRejection {
    /// Machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCode => "invalid_code",
            Self::AlreadyUsed => "already_used",
            Self::ElectionInactive => "election_inactive",
            Self::EmptySelection => "empty_selection",
            Self::TooManySelections { .. } => "too_many_selections",
            Self::InvalidCandidate => "invalid_candidate",
        }
    }

    /// HTTP status the rejection is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::InvalidCode => Status::NotFound,
            Self::AlreadyUsed | Self::ElectionInactive => Status::Conflict,
            Self::EmptySelection | Self::TooManySelections { .. } => Status::UnprocessableEntity,
            Self::InvalidCandidate => Status::BadRequest,
        }
    }

    /// Whether the rejection cannot happen through the normal ballot form,
    /// i.e. the request was malformed or tampered with.
    pub fn is_tampering(&self) -> bool {
        matches!(self, Self::InvalidCandidate)
    }
}

/// JSON body of a rejected request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RejectionBody {
    pub rejected: &'static str,
    pub message: String,
}

impl From<RedemptionRejection> for RejectionBody {
    fn from(rejection: RedemptionRejection) -> Self {
        Self {
            rejected: rejection.reason(),
            message: rejection.to_string(),
        }
    }
}
