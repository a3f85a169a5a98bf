use notes_backend::config::Config;
use notes_backend::{build_rocket, service_from_config};
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Logging already initialised: {}", e);
    }

    let config = Config::load()?;
    let service = service_from_config(&config).await?;

    build_rocket(service, &config).launch().await?;
    Ok(())
}
