//! Content mutation events

use serde::{Deserialize, Serialize};

/// Kind of change applied to a content entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn all() -> Vec<Self> {
        vec![Self::Created, Self::Updated, Self::Deleted]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A committed change to a content entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationEvent {
    /// Entity type name, e.g. `Service`
    pub entity_type: String,
    pub change: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

impl MutationEvent {
    pub fn new(entity_type: impl Into<String>, change: ChangeKind) -> Self {
        Self {
            entity_type: entity_type.into(),
            change,
            entity_id: None,
        }
    }

    pub fn created(entity_type: impl Into<String>) -> Self {
        Self::new(entity_type, ChangeKind::Created)
    }

    pub fn updated(entity_type: impl Into<String>) -> Self {
        Self::new(entity_type, ChangeKind::Updated)
    }

    pub fn deleted(entity_type: impl Into<String>) -> Self {
        Self::new(entity_type, ChangeKind::Deleted)
    }

    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }
}
