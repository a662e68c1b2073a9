use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_site::config::SiteConfig;
use folio_site::connect::connect;
use folio_site::snapshot::PortfolioSnapshot;
use folio_site::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_site=debug,folio_query=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = SiteConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        preview_limit = config.preview_limit,
        stale_secs = config.query.stale_time.as_secs(),
        fetch_timeout_secs = config.query.fetch_timeout.as_secs(),
        "Loaded site configuration"
    );

    // --- Backend ---
    let client = connect(&config)
        .await
        .context("Failed to connect to the content backend")?;

    // --- Portfolio section ---
    let orchestrator = Orchestrator::load(client)
        .await
        .context("Failed to load categories")?
        .with_preview_limit(config.preview_limit);

    // The section is on screen: warm every category while the preview loads.
    orchestrator.section_visible();
    let snapshot = PortfolioSnapshot::capture(&orchestrator)
        .await
        .context("Failed to load projects")?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
