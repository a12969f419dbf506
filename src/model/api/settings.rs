use serde::{Deserialize, Serialize};

use crate::model::db::settings::Settings;

use super::non_blank;

/// Public school settings; also the body of an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolSettings {
    pub school_name: String,
    /// Opaque reference to the school logo, e.g. a file name.
    #[serde(default)]
    pub logo: Option<String>,
}

impl SchoolSettings {
    /// Trim the name and drop a blank logo reference.
    pub fn normalise(self) -> Self {
        Self {
            school_name: self.school_name.trim().to_string(),
            logo: non_blank(self.logo),
        }
    }
}

impl From<Settings> for SchoolSettings {
    fn from(settings: Settings) -> Self {
        Self {
            school_name: settings.school_name,
            logo: settings.logo,
        }
    }
}
