//! Hindsight - Chat history Q&A assistant
//!
//! Indexes the chat messages it sees and answers questions about them,
//! preferring the most recent evidence.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hindsight::{
    agent::{AnswerEngine, OpenAiSynthesizer},
    channels::{SlackAuth, SlackClient},
    config::HindsightConfig,
    gateway::{self, AppState, EventDispatcher},
    memory::{FileRecordStore, Indexer, OpenAiEmbedding, RecordStore, Retriever},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hindsight")]
#[command(version)]
#[command(about = "Chat history Q&A assistant with recency-weighted semantic recall")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "HINDSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook gateway
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hindsight={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => HindsightConfig::load(path)?,
        None => HindsightConfig::default(),
    };

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            run_serve(config).await?;
        }
        Commands::Config { default } => {
            let config = if default {
                HindsightConfig::default()
            } else {
                config
            };
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

async fn run_serve(config: HindsightConfig) -> Result<()> {
    tracing::info!("Starting hindsight");

    // Secrets come from the environment, never the config file
    let bot_token = require_env(&config.slack.bot_token_env)?;
    let signing_secret = require_env(&config.slack.signing_secret_env)?;
    let embedding_key = require_env(&config.embedding.api_key_env)?;
    let synthesis_key = require_env(&config.synthesis.api_key_env)?;

    // Storage and model providers
    let store = Arc::new(
        FileRecordStore::new(&config.storage.base_dir)
            .await
            .context("failed to open record store")?,
    );
    tracing::info!(
        records = store.count().await,
        dir = %config.storage.base_dir.display(),
        "Record store ready"
    );
    let embedder = Arc::new(OpenAiEmbedding::new(&config.embedding, embedding_key)?);
    let synthesizer = Arc::new(OpenAiSynthesizer::new(&config.synthesis, synthesis_key)?);

    // Core pipeline
    let indexer = Arc::new(Indexer::new(store.clone(), embedder.clone()));
    let retriever = Arc::new(Retriever::new(
        store,
        embedder,
        config.retrieval.context_size,
    ));
    let engine = Arc::new(AnswerEngine::new(retriever, synthesizer));

    // Slack handshake: learn our own user id, join the configured channel
    let slack = Arc::new(SlackClient::new(&config.slack, bot_token));
    let bot_user_id = slack
        .auth_test()
        .await
        .context("Slack auth.test failed")?;
    tracing::info!(bot_user_id = %bot_user_id, "Authenticated with Slack");

    if !config.slack.channel.is_empty() {
        if let Err(e) = slack.join_channel(&config.slack.channel).await {
            tracing::warn!(channel = %config.slack.channel, "Could not join channel: {}", e);
        }
    }

    let state = AppState {
        auth: Arc::new(SlackAuth::new(signing_secret)),
        dispatcher: Arc::new(EventDispatcher::new(indexer, engine, slack, bot_user_id)),
    };

    gateway::serve(&config.gateway, state).await?;
    Ok(())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("environment variable {name} is not set"))
}
