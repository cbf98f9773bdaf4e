//! Content record entity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Localized text of one field: locale -> text
pub type LocalizedText = BTreeMap<String, String>;

/// A piece of site content with localized fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub entity_type: String,
    pub id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// field -> locale -> text
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedText>,
}

fn default_active() -> bool {
    true
}

impl ContentRecord {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            active: true,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, field: &str, locale: &str, text: &str) -> Self {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(locale.to_string(), text.to_string());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Translation key of a field, e.g. `service.1.title`
    pub fn translation_key(&self, field: &str) -> String {
        format!("{}.{}.{}", self.entity_type.to_lowercase(), self.id, field)
    }

    /// Non-empty texts of this record: locale -> key -> text
    pub fn localized_entries(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut entries: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();

        for (field, texts) in &self.fields {
            for (locale, text) in texts {
                if text.trim().is_empty() {
                    continue;
                }
                entries
                    .entry(locale.clone())
                    .or_default()
                    .insert(self.translation_key(field), text.clone());
            }
        }

        entries
    }
}
