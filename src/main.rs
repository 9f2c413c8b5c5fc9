use clap::Parser;
use std::env;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod commands;
mod config;
mod core;
mod display;
mod extract;
mod form;
mod input;
mod orchestrator;
mod prompt;
mod providers;
mod session;
mod utils;

use crate::app::Application;
use crate::cli::Args;
use crate::commands::create_command_registry;
use crate::config::{API_KEY_ENV, Config, Settings};
use crate::core::error::AssistError;
use crate::orchestrator::ResponseOrchestrator;
use crate::providers::gemini::GeminiProvider;

/// Logs go to stderr so they never interleave with streamed answers on stdout.
fn init_logging(level: &str) -> Result<(), AssistError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AssistError::Config(format!("Invalid log level '{}': {}", level, e)))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| AssistError::Config(format!("Failed to initialize logging: {}", e)))
}

async fn run() -> Result<(), AssistError> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::load()?;
    init_logging(&config::log_level(&config, &args))?;

    let api_key = config::require_api_key(env::var(API_KEY_ENV).ok()).inspect_err(|_| {
        error!("No API key found. Please set {} in your .env file", API_KEY_ENV);
    })?;
    let settings = Settings::resolve(&config, &args, api_key);
    info!(model = %settings.model, mode = ?settings.mode, "Gemini client initialized");

    let provider = GeminiProvider::with_endpoint(
        settings.base_url.clone(),
        settings.api_key.clone(),
        settings.model.clone(),
    );
    let orchestrator = ResponseOrchestrator::new(
        Box::new(provider),
        settings.mode,
        settings.history_window,
        settings.max_upload_bytes,
    );

    Application::new(args, orchestrator, create_command_registry())
        .run()
        .await
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display::display_error(&e.to_string());
        std::process::exit(1);
    }
}
