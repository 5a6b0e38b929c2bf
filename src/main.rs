use portfolio_stats::config::{Config, load_config, token_from_env};
use portfolio_stats::contact::ContactLog;
use portfolio_stats::server::{ServerState, build_rocket};
use portfolio_stats::{StatsAggregator, StatsView};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let (mut config, config_error) = match load_config("config.yml").await {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    config.github.token = token_from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("portfolio_stats={},rocket=warn", config.logging.level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = config_error {
        warn!("Failed to load config.yml: {e:#}. Using defaults.");
    }
    if config.github.token.is_none() {
        warn!("GITHUB_TOKEN is not set; stats requests will be refused");
    }

    let aggregator = StatsAggregator::from_config(&config)?;
    let state = ServerState {
        view: StatsView::new(aggregator, &config.cache),
        contacts: ContactLog::open(&config.contact.database)?,
    };

    info!("Starting portfolio-stats server");
    build_rocket(state)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Server failed: {e}"))?;

    Ok(())
}
