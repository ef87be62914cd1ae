use std::path::PathBuf;
use subtitlarr::{Config, SubtitleService, run_with_shutdown};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> subtitlarr::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subtitlarr=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Could not load config, using defaults"
            );
            Config::default()
        }
    };

    // Write back so a fresh install gets a complete file to edit
    if let Err(e) = config.save(&config_path) {
        tracing::warn!(path = %config_path.display(), error = %e, "Could not save config");
    }

    let service = SubtitleService::new(config, Some(config_path));
    service.start().await;

    let api_handle = service.spawn_api_server();
    let result = run_with_shutdown(service).await;
    api_handle.abort();
    result
}
