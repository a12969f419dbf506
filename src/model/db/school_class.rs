use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::model::{
    common::class_name::compare_class_names,
    common::election::{ElectionId, SchoolClassId},
};

/// Core school class data, as stored in the database.
///
/// Classes only drive per-class code generation; they grant nothing.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SchoolClassCore {
    pub election_id: ElectionId,
    pub name: String,
    /// Expected number of students, i.e. codes to provision for this class.
    pub student_count: u32,
}

/// A school class from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SchoolClass {
    #[serde(rename = "_id")]
    pub id: SchoolClassId,
    #[serde(flatten)]
    pub class: SchoolClassCore,
}

impl SchoolClass {
    pub fn new(id: SchoolClassId, election_id: ElectionId, name: String, student_count: u32) -> Self {
        Self {
            id,
            class: SchoolClassCore {
                election_id,
                name,
                student_count,
            },
        }
    }

    /// Sort classes in natural name order.
    pub fn sort(classes: &mut [SchoolClass]) {
        classes.sort_by(|a, b| compare_class_names(&a.name, &b.name));
    }
}

impl Deref for SchoolClass {
    type Target = SchoolClassCore;

    fn deref(&self) -> &Self::Target {
        &self.class
    }
}

impl DerefMut for SchoolClass {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_sort_naturally() {
        let mut classes: Vec<_> = ["10d", "5b", "Staff", "6a", "5a"]
            .into_iter()
            .enumerate()
            .map(|(i, name)| SchoolClass::new(i as u32 + 1, 1, name.to_string(), 25))
            .collect();
        SchoolClass::sort(&mut classes);
        let names: Vec<_> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["5a", "5b", "6a", "10d", "Staff"]);
    }
}
