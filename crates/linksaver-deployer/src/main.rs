//! linksaver-deployer: provisions the serverless estimates backend
//!
//! Creates the IAM role, DynamoDB table, handler Lambda, HTTP API gateway,
//! and API key/usage plan in one sequential run, then prints the endpoint
//! URL and the secret key for the client integration.

use anyhow::Result;
use clap::Parser;
use linksaver_common::defaults::{DEFAULT_BASE_NAME, DEFAULT_RESERVED_CONCURRENCY};
use linksaver_common::names::{ResourceNames, RunSuffix};
use linksaver_deployer::aws::{classify_aws_error, extract_error_details};
use linksaver_deployer::config::{resolve_region, DeployConfig};
use linksaver_deployer::orchestrator;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "linksaver-deployer")]
#[command(about = "Provisions the serverless estimates backend on AWS")]
#[command(version)]
struct Args {
    /// AWS region (defaults to the region configured in the environment)
    #[arg(long)]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Path to the prebuilt linksaver-handler binary to deploy
    #[arg(long, env = "LINKSAVER_HANDLER_ARTIFACT")]
    artifact: PathBuf,

    /// Base name embedded in every resource name
    #[arg(long, default_value = DEFAULT_BASE_NAME)]
    base_name: String,

    /// Reuse a previous run's name suffix instead of generating a new one
    #[arg(long)]
    suffix: Option<String>,

    /// Reserved concurrency cap for the handler function
    #[arg(long, default_value_t = DEFAULT_RESERVED_CONCURRENCY)]
    reserved_concurrency: i32,

    /// Leave the handler's concurrency uncapped
    #[arg(long)]
    no_concurrency_cap: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print the failure banner: the error chain, a suggestion when one is
/// known, and the manual-cleanup notice.
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n{}", "=".repeat(60));
    let _ = writeln!(stderr, "DEPLOYMENT FAILED");
    let _ = writeln!(stderr, "{}", "=".repeat(60));
    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    let details = extract_error_details(e);
    if let Some(suggestion) = &details.suggestion {
        let _ = writeln!(stderr, "\nSuggestion: {suggestion}");
    }
    if classify_aws_error(details.code.as_deref(), Some(&details.message)).is_retryable() {
        let _ = writeln!(stderr, "This failure is transient; re-running may succeed.");
    }

    let _ = writeln!(
        stderr,
        "\nNo automatic cleanup is performed. Resources created before the \
         failure must be removed manually (they share this run's name suffix)."
    );
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling deployment");
                cancel.cancel();
            }
        });
    }

    let region = resolve_region(args.region).await?;
    let suffix = match &args.suffix {
        Some(s) => RunSuffix::parse(s).map_err(anyhow::Error::msg)?,
        None => RunSuffix::generate(),
    };
    let names = ResourceNames::new(&args.base_name, suffix);
    info!(region = %region, suffix = %names.suffix(), "Starting deployment");

    let config = DeployConfig {
        region,
        profile: args.aws_profile,
        artifact: args.artifact,
        reserved_concurrency: (!args.no_concurrency_cap).then_some(args.reserved_concurrency),
        names,
    };

    let outputs = orchestrator::deploy(&config, &cancel).await?;

    println!("\n{}", "=".repeat(60));
    println!("Deployment complete");
    println!("{}", "=".repeat(60));
    println!("\nCopy these two values into the client integration:\n");
    println!("  URL:     {}", outputs.endpoint_url);
    println!("  API key: {}", outputs.api_key);
    println!(
        "\nAll resources share the name suffix '{}'.",
        config.names.suffix()
    );

    Ok(())
}
