//! Translations command - catalog validation and key sync

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use tracing::info;

use crate::domain::translation::ValidationReport;

#[derive(Subcommand)]
pub enum TranslationsCommand {
    /// Check catalogs for missing keys, placeholder mismatches and formatting problems
    Validate(ValidateArgs),

    /// Fill keys missing from a locale with `[LOCALE: key]` markers
    Sync,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Print every finding, not only the summary
    #[arg(long)]
    pub detailed: bool,

    /// Sync missing keys and trim padded values before validating
    #[arg(long)]
    pub fix: bool,

    /// Write the full report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub export_report: Option<PathBuf>,
}

pub async fn run(command: TranslationsCommand) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state(&config).await?;
    let translations = &state.translations;

    match command {
        TranslationsCommand::Validate(args) => {
            if args.fix {
                let outcome = translations.fix().await?;
                println!(
                    "Fixed catalogs: {} keys synced, {} values trimmed",
                    outcome.synced, outcome.trimmed
                );
            }

            let report = translations.validate().await?;
            print!("{}", render_report(&report, args.detailed));

            if let Some(path) = args.export_report {
                let data = serde_json::to_string_pretty(&report)?;
                tokio::fs::write(&path, data).await?;
                info!(path = %path.display(), "Validation report exported");
                println!("Report written to {}", path.display());
            }
        }
        TranslationsCommand::Sync => {
            let added = translations.sync_keys().await?;
            println!("Added {} missing translation keys", added);
        }
    }

    Ok(())
}

/// Human readable rendering of a validation report
pub fn render_report(report: &ValidationReport, detailed: bool) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Languages:            {}", summary.total_languages);
    let _ = writeln!(out, "Missing translations: {}", summary.missing_count);
    let _ = writeln!(out, "Placeholder issues:   {}", summary.placeholder_issues_count);
    let _ = writeln!(out, "Empty values:         {}", summary.empty_translations_count);
    let _ = writeln!(out, "Formatting issues:    {}", summary.formatting_issues_count);
    let _ = writeln!(out, "Duplicate values:     {}", summary.duplicate_values_count);
    let _ = writeln!(out, "Health score:         {}/100", summary.health_score);

    if !detailed {
        return out;
    }

    for (locale, keys) in report.missing_translations.iter().filter(|(_, k)| !k.is_empty()) {
        let _ = writeln!(out, "\n[{}] missing:", locale);
        for key in keys {
            let _ = writeln!(out, "  - {}", key);
        }
    }

    for (key, by_locale) in &report.placeholder_issues {
        let _ = writeln!(out, "\nplaceholders differ for {}:", key);
        for (locale, names) in by_locale {
            let _ = writeln!(out, "  {}: {}", locale, names.join(", "));
        }
    }

    for (locale, keys) in &report.empty_translations {
        let _ = writeln!(out, "\n[{}] empty: {}", locale, keys.join(", "));
    }

    for (locale, issues) in &report.formatting_issues {
        let _ = writeln!(out, "\n[{}] formatting:", locale);
        for issue in issues {
            let _ = writeln!(out, "  - {} ({:?}): {:?}", issue.key, issue.issue, issue.value);
        }
    }

    for (locale, values) in &report.duplicate_values {
        let _ = writeln!(out, "\n[{}] duplicate values:", locale);
        for (value, keys) in values {
            let _ = writeln!(out, "  {:?}: {}", value, keys.join(", "));
        }
    }

    out
}
