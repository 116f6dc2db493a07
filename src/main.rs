use anyhow::{Context, Result};
use askbot::client::AskClient;
use askbot::config::AppConfig;
use askbot::speech::SpeechBackends;
use askbot::ui::{self, ChatSession};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askbot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Askbot");

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!("Answer endpoint: {}", config.endpoint);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("askbot-io")
        .build()
        .context("Failed to start async runtime")?;

    let client = AskClient::from_config(&config).context("Failed to build HTTP client")?;
    let speech = SpeechBackends::from_config(&config);
    let session = ChatSession::new(
        Arc::new(client),
        speech,
        &config.language,
        runtime.handle().clone(),
    );

    ui::run(session, runtime).map_err(|e| anyhow::anyhow!("UI error: {}", e))?;

    info!("Askbot exited");
    Ok(())
}
