mod config;
mod main_lib;
mod navigator;
mod render;
mod secrets;

use config::Config;
use main_lib::{build_state, init_tracing, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();
    let state = build_state(&config)?;
    tracing::debug!("Using API at {}", config.api_url);

    let output = run(&state, &config).await?;
    print!("{}", output);
    Ok(())
}
