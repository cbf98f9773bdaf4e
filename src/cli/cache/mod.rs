//! Cache command - inspection and maintenance against the configured backend

use clap::{Args, Subcommand};

use crate::api::v1::cache::parse_tags;

#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show key counts per namespace
    Stats,

    /// Remove everything, or only keys matching a pattern or tags
    Clear(ClearArgs),

    /// Delete entries that no longer decode
    Sweep {
        /// Glob over keys, defaults to every value namespace
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Load every configured locale into the cache
    Warmup,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Glob over keys, e.g. `translations:*`
    #[arg(long, conflicts_with = "tags")]
    pub pattern: Option<String>,

    /// Comma separated tags, e.g. `api,model:Service`
    #[arg(long)]
    pub tags: Option<String>,
}

pub async fn run(command: CacheCommand) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state(&config).await?;
    let admin = &state.cache_admin;

    match command {
        CacheCommand::Stats => {
            let stats = admin.stats().await?;
            println!("Backend:    {}", stats.backend);
            println!("Total keys: {}", stats.total_keys);
            for (namespace, count) in &stats.namespaces {
                println!("  {:<14} {}", namespace, count);
            }
        }
        CacheCommand::Clear(args) => {
            let outcome = match (args.pattern, args.tags) {
                (_, Some(raw)) => {
                    let tags = parse_tags(&raw);
                    if tags.is_empty() {
                        anyhow::bail!("no tags given");
                    }
                    admin.clear_tags(&tags).await
                }
                (Some(pattern), None) => admin.clear_pattern(&pattern).await?,
                (None, None) => admin.clear_all().await?,
            };
            println!("Cleared {} keys ({})", outcome.removed, outcome.scope);
        }
        CacheCommand::Sweep { pattern } => {
            let report = admin.sweep(pattern.as_deref()).await?;
            println!(
                "Scanned {} keys, {} corrupted, {} deleted, {} unreadable",
                report.scanned, report.corrupted, report.deleted, report.errors
            );
            for key in &report.corrupted_keys {
                println!("  - {}", key);
            }
        }
        CacheCommand::Warmup => {
            let locales = state.translations.warmup().await;
            println!("Warmed {} locales", locales);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::cli::{Cli, Command};

    use super::*;

    #[test]
    fn test_parse_clear_with_tags() {
        let cli = Cli::try_parse_from(["site-content-cache", "cache", "clear", "--tags", "api,dynamic"])
            .unwrap();

        match cli.command {
            Command::Cache(CacheCommand::Clear(args)) => {
                assert_eq!(args.tags.as_deref(), Some("api,dynamic"));
                assert!(args.pattern.is_none());
            }
            _ => panic!("expected cache clear"),
        }
    }

    #[test]
    fn test_clear_pattern_and_tags_conflict() {
        let result = Cli::try_parse_from([
            "site-content-cache",
            "cache",
            "clear",
            "--tags",
            "api",
            "--pattern",
            "api:*",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_translations_validate() {
        let cli = Cli::try_parse_from([
            "site-content-cache",
            "translations",
            "validate",
            "--detailed",
            "--export-report",
            "report.json",
        ])
        .unwrap();

        match cli.command {
            Command::Translations(crate::cli::translations::TranslationsCommand::Validate(args)) => {
                assert!(args.detailed);
                assert!(!args.fix);
                assert_eq!(args.export_report.unwrap().to_str(), Some("report.json"));
            }
            _ => panic!("expected translations validate"),
        }
    }
}
