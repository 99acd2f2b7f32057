use donor_retention::config::{apply_env_overrides, load_config, AppConfig};
use donor_retention::loader::AnySource;
use donor_retention::model::NotifyError;
use donor_retention::notifier::TelegramNotifier;
use donor_retention::pipeline;
use donor_retention::report;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // .env is optional; the variables may already be exported
    if dotenv::dotenv().is_err() {
        info!("No .env file found, using process environment");
    }

    let config: AppConfig = match load_config("config.json") {
        Ok(mut cfg) => match apply_env_overrides(&mut cfg, |k| std::env::var(k).ok()) {
            Ok(()) => cfg,
            Err(e) => {
                error!("Config error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let source = match AnySource::new() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize record source: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Loading datasets...");
    let data = match pipeline::load(&source, &config.sources, &config.analysis.age_buckets).await {
        Ok(data) => data,
        Err(e) => {
            error!("Load failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let retention = pipeline::compute(&data, &config.analysis);
    let sections = report::render(&retention, &config.analysis);
    info!("Rendered {} report sections", sections.len());

    match TelegramNotifier::from_settings(config.telegram_bot_token.as_deref(), config.telegram_chat_id) {
        Ok(notifier) => {
            let delivered = notifier.send_sections(&sections).await;
            info!("Delivered {}/{} sections", delivered, sections.len());
            if delivered < sections.len() {
                return ExitCode::FAILURE;
            }
        }
        Err(NotifyError::NotConfigured) => {
            warn!("Telegram not configured, printing report to stdout");
            for section in &sections {
                println!("{}\n", section.to_message());
            }
        }
        Err(e) => {
            error!("Notifier error: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
