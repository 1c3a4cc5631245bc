use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: String,
    /// `None` for the built-in catalogue shared by every user.
    pub user_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExerciseRecord {
    /// Short label used for history badges.
    pub fn label(&self) -> &str {
        self.short_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCreateInput {
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
}
