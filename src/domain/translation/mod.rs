//! Translation domain - catalogs, sources and integrity checks

mod catalog;
mod store;
mod validation;

pub use catalog::{CatalogSource, CombinedCatalog, TranslationCatalog};
pub use store::{CatalogStore, LocalizedContentProvider, LocalizedFields};
pub use validation::{
    extract_placeholders, missing_keys, FormattingIssue, FormattingIssueKind, LocaleCatalogs,
    ValidationReport, ValidationSummary,
};

#[cfg(test)]
pub use store::mock::MockContentProvider;
