use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, SchoolClassId},
    db::school_class::SchoolClass,
};

/// A school class specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolClassSpec {
    pub name: String,
    pub student_count: u32,
}

impl SchoolClassSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Status(
                Status::BadRequest,
                "Class name must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_class(self, id: SchoolClassId, election_id: ElectionId) -> SchoolClass {
        SchoolClass::new(id, election_id, self.name.trim().to_string(), self.student_count)
    }
}

/// An API-friendly school class description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolClassDescription {
    pub id: SchoolClassId,
    pub name: String,
    pub student_count: u32,
}

impl From<SchoolClass> for SchoolClassDescription {
    fn from(class: SchoolClass) -> Self {
        Self {
            id: class.id,
            name: class.class.name,
            student_count: class.class.student_count,
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl SchoolClassSpec {
        pub fn example(name: &str, student_count: u32) -> Self {
            Self {
                name: name.to_string(),
                student_count,
            }
        }
    }
}
