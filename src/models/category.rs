use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewCategory {
    #[validate(
        length(max = 100, message = "name cannot exceed 100 characters"),
        custom = "not_blank"
    )]
    pub name: String,
}

/// Active-flag filter shared by the name-keyed lookups and goals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    #[serde(default)]
    pub include_inactive: bool,
}

impl ListFilter {
    pub fn active() -> Self {
        Self {
            include_inactive: false,
        }
    }

    pub fn all() -> Self {
        Self {
            include_inactive: true,
        }
    }

    pub fn admits(&self, active: bool) -> bool {
        self.include_inactive || active
    }
}

/// Names compare trimmed and case-insensitively.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
