//! Operator helper: validate a base URL or show which candidate it resolves to.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use memdm::{
    client::{BaseUrlResolver, MemoryServiceClient, resolver::candidate_urls},
    logging,
};

#[derive(Parser)]
#[command(
    name = "memdm-check",
    about = "Check connectivity to a mem-dm memory service"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the credential validation used when a base URL is saved.
    Validate {
        /// Base URL of the memory service.
        #[arg(long, env = "MEM_DM_BASE_URL")]
        base_url: String,
    },
    /// Probe the candidates of a base URL setting and print the one that would be used.
    Resolve {
        /// Single URL, comma-separated list, or `auto`.
        #[arg(long, env = "MEM_DM_BASE_URL")]
        base_url: String,
        /// Health probe timeout in milliseconds.
        #[arg(long, default_value_t = 1200)]
        probe_timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let cli = Cli::parse();
    let client = MemoryServiceClient::new().context("failed to build HTTP client")?;

    match cli.command {
        Command::Validate { base_url } => {
            if let Err(error) = client.validate_credentials(&base_url).await {
                bail!("{error}");
            }
            println!("ok: {}", base_url.trim_end_matches('/'));
        }
        Command::Resolve {
            base_url,
            probe_timeout_ms,
        } => {
            let resolver = BaseUrlResolver::with_settings(
                client.http().clone(),
                Duration::ZERO,
                Duration::from_millis(probe_timeout_ms),
            );
            for candidate in candidate_urls(&base_url) {
                let outcome = resolver.probe(&candidate).await;
                println!("{candidate}\t{outcome:?}");
            }
            println!("selected: {}", resolver.resolve(&base_url).await);
        }
    }

    Ok(())
}
