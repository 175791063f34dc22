mod builder;
mod config;
mod dispatch;
mod ebay;
mod http;
mod mapping;
mod pipeline;
mod sheet;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use builder::PayloadBuilder;
use config::AppConfig;
use dispatch::BatchDispatcher;
use ebay::images::PictureUploader;
use ebay::store::TokenStore;
use ebay::{SellClient, TokenLifecycle, taxonomy};
use pipeline::Pipeline;

/// Bulk-create eBay inventory items and offers from a listings sheet.
#[derive(Debug, Parser)]
#[command(name = "ebay-bulk-lister", version)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, value_name = "FILE")]
    config: std::path::PathBuf,

    /// Target the sandbox environment instead of production.
    #[arg(long)]
    sandbox: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!(target = "lister.main", "run aborted: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load(&cli.config, cli.sandbox)?;
    info!(
        target = "lister.main",
        env = config.env.name(),
        "configuration loaded"
    );

    let store = match &config.profile.token_file {
        Some(path) => TokenStore::with_path(path.clone()),
        None => TokenStore::for_env(config.env),
    };
    let mut tokens = TokenLifecycle::new(config.env, config.profile.credentials(), store);
    tokens.load_or_authorize().await?;
    let access_token = tokens
        .access_token()
        .ok_or("no access token after authorization")?
        .to_string();

    preflight_taxonomy(&tokens, config.env).await;

    let rows = sheet::read_rows(&config.profile.spreadsheet)?;

    let uploader = PictureUploader::new(
        config.env,
        config.profile.credentials(),
        config.profile.photo_dir.clone(),
        access_token.clone(),
    );
    let sink = SellClient::new(config.env, access_token);
    let summary = Pipeline::new(PayloadBuilder::new(uploader), BatchDispatcher::new(sink))
        .run(&rows)
        .await;

    info!(
        target = "lister.main",
        rows = summary.rows,
        built = summary.built,
        skipped = summary.skipped,
        failed = summary.failed,
        batches = summary.dispatch.flushes,
        failed_batches = summary.dispatch.failed_submissions,
        pauses = summary.dispatch.pauses,
        "run finished"
    );
    Ok(())
}

/// Read-only sanity check on the metadata API with a client-credentials
/// token; failures only warn, the listing flow does not depend on it.
async fn preflight_taxonomy(tokens: &TokenLifecycle, env: ebay::EbayEnv) {
    match tokens.client_credentials_token().await {
        Ok(app_token) => {
            match taxonomy::default_category_tree_id(
                &http::build_client(),
                env,
                builder::DEFAULT_MARKETPLACE,
                &app_token,
            )
            .await
            {
                Ok(tree_id) => info!(
                    target = "lister.main",
                    tree_id = %tree_id,
                    "category tree resolved"
                ),
                Err(err) => warn!(
                    target = "lister.main",
                    error = %err,
                    "category tree lookup failed"
                ),
            }
        }
        Err(err) => warn!(
            target = "lister.main",
            error = %err,
            "client credentials token unavailable"
        ),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
