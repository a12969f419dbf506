use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request,
};
use thiserror::Error;

use crate::model::common::redemption::{RedemptionRejection, RejectionBody};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{1}")]
    Status(Status, String),
    #[error(transparent)]
    Rejected(#[from] RedemptionRejection),
    #[error("No voting codes have been generated for this election yet")]
    NoCodesGenerated,
}

impl Error {
    /// A 404 for the named resource, e.g. `Error::not_found(format!("Election {id}"))`.
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Status(status, _) => *status,
            Self::Rejected(rejection) => rejection.status(),
            Self::NoCodesGenerated => Status::Conflict,
        }
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        match self {
            // Typed rejections carry a body the client can act on.
            Self::Rejected(rejection) => {
                (status, Json(RejectionBody::from(rejection))).respond_to(req)
            }
            Self::NoCodesGenerated => {
                let body = RejectionBody {
                    rejected: "no_codes_generated",
                    message: self.to_string(),
                };
                (status, Json(body)).respond_to(req)
            }
            _ => {
                if status.code >= 500 {
                    error!("{self}");
                } else {
                    warn!("{self}");
                }
                Err(status)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            Error::not_found("Election 4".to_string()).status(),
            Status::NotFound
        );
        assert_eq!(Error::NoCodesGenerated.status(), Status::Conflict);
        assert_eq!(
            Error::from(RedemptionRejection::AlreadyUsed).status(),
            Status::Conflict
        );
        assert_eq!(
            Error::from(JwtError::from(JwtErrorKind::ExpiredSignature)).status(),
            Status::Unauthorized
        );
        assert_eq!(
            Error::from(JwtError::from(JwtErrorKind::InvalidToken)).status(),
            Status::BadRequest
        );
    }

    #[test]
    fn not_found_message() {
        let err = Error::not_found("Candidate 7".to_string());
        assert_eq!(err.to_string(), "Candidate 7 not found");
    }
}
