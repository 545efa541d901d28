use pulse_link::pipeline::Pipeline;
use pulse_link::settings::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("pulse-link v{} starting", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load_or_default()?;
    Pipeline::new(settings).run().await
}
