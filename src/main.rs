use clap::Parser;
use site_content_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Translations(command) => cli::translations::run(command).await,
        Command::Cache(command) => cli::cache::run(command).await,
    }
}
