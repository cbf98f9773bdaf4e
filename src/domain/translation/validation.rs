//! Catalog integrity checks
//!
//! Every finding is advisory: the checks build a report and never fail.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::catalog::TranslationCatalog;

static PLACEHOLDER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\{(\w+)\}",
        r"\{\{(\w+)\}\}",
        r"%\((\w+)\)s",
        r"%(\w+)%",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid placeholder pattern"))
    .collect()
});

/// Values this short are expected to repeat ("Yes", "No", ...)
const MIN_DUPLICATE_LEN: usize = 4;

/// Catalogs of every configured locale
pub type LocaleCatalogs = BTreeMap<String, TranslationCatalog>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingIssueKind {
    WhitespacePadding,
    TitleWithPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattingIssue {
    pub key: String,
    pub issue: FormattingIssueKind,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_languages: usize,
    pub missing_count: usize,
    pub formatting_issues_count: usize,
    pub duplicate_values_count: usize,
    pub empty_translations_count: usize,
    pub placeholder_issues_count: usize,
    pub total_issues: usize,
    pub health_score: u32,
}

/// Full integrity report over all locales
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// locale -> keys present elsewhere but absent here
    pub missing_translations: BTreeMap<String, Vec<String>>,
    /// key -> locale -> placeholder names
    pub placeholder_issues: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub empty_translations: BTreeMap<String, Vec<String>>,
    pub formatting_issues: BTreeMap<String, Vec<FormattingIssue>>,
    /// locale -> value -> keys sharing it
    pub duplicate_values: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    pub summary: ValidationSummary,
}

impl ValidationReport {
    /// Runs every check over the given catalogs
    pub fn build(catalogs: &LocaleCatalogs) -> Self {
        let mut report = Self {
            missing_translations: missing_keys(catalogs),
            placeholder_issues: placeholder_issues(catalogs),
            empty_translations: BTreeMap::new(),
            formatting_issues: BTreeMap::new(),
            duplicate_values: BTreeMap::new(),
            summary: ValidationSummary::default(),
        };

        for (locale, catalog) in catalogs {
            let empty = empty_values(catalog);
            if !empty.is_empty() {
                report.empty_translations.insert(locale.clone(), empty);
            }

            let formatting = formatting_issues(catalog);
            if !formatting.is_empty() {
                report.formatting_issues.insert(locale.clone(), formatting);
            }

            let duplicates = duplicate_values(catalog);
            if !duplicates.is_empty() {
                report.duplicate_values.insert(locale.clone(), duplicates);
            }
        }

        report.summary = report.summarize(catalogs.len());
        report
    }

    fn summarize(&self, total_languages: usize) -> ValidationSummary {
        let missing_count: usize = self.missing_translations.values().map(Vec::len).sum();
        let formatting_issues_count: usize = self.formatting_issues.values().map(Vec::len).sum();
        let duplicate_values_count: usize = self.duplicate_values.values().map(BTreeMap::len).sum();
        let empty_translations_count: usize = self.empty_translations.values().map(Vec::len).sum();
        let placeholder_issues_count = self.placeholder_issues.len();

        let total_issues = missing_count
            + formatting_issues_count
            + duplicate_values_count
            + empty_translations_count
            + placeholder_issues_count;

        let health_score = 100usize.saturating_sub(total_issues.saturating_mul(2)) as u32;

        ValidationSummary {
            total_languages,
            missing_count,
            formatting_issues_count,
            duplicate_values_count,
            empty_translations_count,
            placeholder_issues_count,
            total_issues,
            health_score,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.summary.total_issues == 0
    }
}

/// Keys each locale lacks relative to the union of all locales
///
/// Every locale appears in the result, with an empty list when complete.
pub fn missing_keys(catalogs: &LocaleCatalogs) -> BTreeMap<String, Vec<String>> {
    let all_keys: BTreeSet<&String> = catalogs.values().flat_map(|c| c.keys()).collect();

    catalogs
        .iter()
        .map(|(locale, catalog)| {
            let missing = all_keys
                .iter()
                .filter(|key| !catalog.contains_key(key))
                .map(|key| key.to_string())
                .collect();
            (locale.clone(), missing)
        })
        .collect()
}

/// Sorted, de-duplicated placeholder names used in a text
pub fn extract_placeholders(text: &str) -> Vec<String> {
    let names: BTreeSet<String> = PLACEHOLDER_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .collect();

    names.into_iter().collect()
}

/// Keys whose placeholder names differ between the locales that define them
fn placeholder_issues(
    catalogs: &LocaleCatalogs,
) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
    let all_keys: BTreeSet<&String> = catalogs.values().flat_map(|c| c.keys()).collect();
    let mut issues = BTreeMap::new();

    for key in all_keys {
        let per_locale: BTreeMap<String, Vec<String>> = catalogs
            .iter()
            .filter_map(|(locale, catalog)| {
                catalog
                    .get(key)
                    .map(|text| (locale.clone(), extract_placeholders(text)))
            })
            .collect();

        let any_placeholders = per_locale.values().any(|names| !names.is_empty());
        let distinct: BTreeSet<&Vec<String>> = per_locale.values().collect();

        if any_placeholders && distinct.len() > 1 {
            issues.insert(key.clone(), per_locale);
        }
    }

    issues
}

fn empty_values(catalog: &TranslationCatalog) -> Vec<String> {
    catalog
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(key, _)| key.clone())
        .collect()
}

fn formatting_issues(catalog: &TranslationCatalog) -> Vec<FormattingIssue> {
    let mut issues = Vec::new();

    for (key, value) in catalog.iter() {
        if (key.ends_with(".title") || key.ends_with(".heading")) && value.ends_with('.') {
            issues.push(FormattingIssue {
                key: key.clone(),
                issue: FormattingIssueKind::TitleWithPeriod,
                value: value.clone(),
            });
        }

        if value.trim() != value {
            issues.push(FormattingIssue {
                key: key.clone(),
                issue: FormattingIssueKind::WhitespacePadding,
                value: value.clone(),
            });
        }
    }

    issues
}

/// Identical values shared by keys with no common path segment
fn duplicate_values(catalog: &TranslationCatalog) -> BTreeMap<String, Vec<String>> {
    let mut by_value: BTreeMap<&String, Vec<String>> = BTreeMap::new();

    for (key, value) in catalog.iter() {
        by_value.entry(value).or_default().push(key.clone());
    }

    by_value
        .into_iter()
        .filter(|(value, keys)| {
            keys.len() > 1 && value.chars().count() >= MIN_DUPLICATE_LEN && !related_keys(keys)
        })
        .map(|(value, keys)| (value.clone(), keys))
        .collect()
}

/// Whether any two keys share a dot-separated segment
fn related_keys(keys: &[String]) -> bool {
    let segments: Vec<BTreeSet<&str>> = keys.iter().map(|k| k.split('.').collect()).collect();

    segments.iter().enumerate().any(|(i, a)| {
        segments[i + 1..]
            .iter()
            .any(|b| a.intersection(b).next().is_some())
    })
}
