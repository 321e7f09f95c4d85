use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile of a conversation counterpart, as surfaced by search and the
/// creator directory. All optional data is explicit; absence has a defined
/// rendering (an empty `media` list means "no media shared yet").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub avatar_ref: Option<String>,
    pub is_featured: bool,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("user-{}", Uuid::new_v4()),
            name: name.into(),
            avatar_ref: None,
            is_featured: false,
            bio: None,
            media: Vec::new(),
        }
    }

    pub fn featured(name: impl Into<String>) -> Self {
        Self {
            is_featured: true,
            ..Self::new(name)
        }
    }

    pub fn has_shared_media(&self) -> bool {
        !self.media.is_empty()
    }
}
