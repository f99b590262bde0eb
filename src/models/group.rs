use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Group every donor falls back to when none is supplied
pub const DEFAULT_GROUP_NAME: &str = "Group A";

/// Groups created by the default bootstrap, in creation order
pub const DEFAULT_GROUP_NAMES: [&str; 3] = ["Group A", "Group B", "Group C"];

pub const DEFAULT_GROUP_DESCRIPTION: &str = "Default collection group";

/// Collection group a donor is visited under
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub area: Option<String>,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: NaiveDateTime,
}

impl Group {
    /// Create a new Group (typically used by in-memory stores)
    pub fn new(
        name: String,
        area: Option<String>,
        description: Option<String>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            area,
            description,
            created_by,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Build the default group with the given name
    pub fn default_named(name: &str, created_by: Uuid) -> Self {
        Self::new(
            name.to_string(),
            None,
            Some(DEFAULT_GROUP_DESCRIPTION.to_string()),
            created_by,
        )
    }

    pub fn summary(&self) -> GroupSummary {
        GroupSummary {
            id: self.id,
            name: self.name.clone(),
            area: self.area.clone(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_GROUP_NAME
    }
}

/// Group fields embedded in donor responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub area: Option<String>,
}
