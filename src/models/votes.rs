use serde::{Deserialize, Serialize};

/// The API embeds a vote's owning event either as a nested object carrying
/// the display name or as a bare id string. Callers resolve the difference
/// at the display boundary, never inside aggregation logic.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum EventRef {
    Detail {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "EventName")]
        name: String,
    },
    Id(String),
}

impl EventRef {
    pub fn id(&self) -> &str {
        match self {
            Self::Detail { id, .. } => id,
            Self::Id(id) => id,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::Detail { name, .. } => Some(name),
            Self::Id(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "eventName")]
    pub event: EventRef,
    pub name: String,
    pub phone: String,
    pub rating: i64,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(rename = "submittedAt")]
    pub submitted_at: String,
}
