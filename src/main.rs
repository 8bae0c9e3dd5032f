//! octo-stats binary entrypoint: refresh the profile dashboard templates.

use std::time::Instant;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use octo_stats::{
    config::AppConfig, github::GithubClient, stats::collect_profile_stats, svg::rewrite_template,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local runs keep their credentials in a .env file; CI injects them.
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;
    let client =
        GithubClient::new(config.access_token.clone()).context("building GitHub client")?;

    let run = Instant::now();
    let stats = collect_profile_stats(&client, &config)
        .await
        .context("collecting profile statistics")?;

    let values = stats.slot_values();
    for path in &config.template_paths {
        rewrite_template(path, &values)
            .with_context(|| format!("rewriting template `{}`", path.display()))?;
        info!(path = %path.display(), "template rewritten");
    }

    for (operation, calls) in client.call_ledger() {
        info!(operation, calls, "GraphQL usage");
    }
    info!(
        elapsed_ms = run.elapsed().as_millis() as u64,
        cache_hit = stats.cache_hit,
        "profile statistics refreshed"
    );

    Ok(())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
