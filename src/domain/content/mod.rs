//! Site content collaborator - records with localized fields

mod record;
mod repository;

pub use record::{ContentRecord, LocalizedText};
pub use repository::ContentRepository;

#[cfg(test)]
pub use repository::MockContentRepository;
