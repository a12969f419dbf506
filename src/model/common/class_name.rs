//! Natural ordering of school class names: `5a < 5b < 6a < 10d`.

use std::cmp::Ordering;

/// Sort key for a class name.
///
/// Names with a leading grade number order by that number, then by the
/// case-folded remainder. Names without one come after every numbered name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassOrder {
    Numbered(u64, String),
    Named(String),
}

impl ClassOrder {
    pub fn of(name: &str) -> Self {
        let name = name.trim();
        let digits = name.len() - name.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Self::Named(name.to_lowercase());
        }
        let (grade, rest) = name.split_at(digits);
        // Only absurdly long digit runs fail to parse; they sort last among numbered names.
        let grade = grade.parse().unwrap_or(u64::MAX);
        Self::Numbered(grade, rest.to_lowercase())
    }
}

/// Compare two class names naturally.
pub fn compare_class_names(a: &str, b: &str) -> Ordering {
    ClassOrder::of(a).cmp(&ClassOrder::of(b))
}

/// Compare two optional class labels naturally; unlabelled sorts last.
pub fn compare_class_labels(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_class_names(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
