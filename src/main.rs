use std::sync::Arc;

use anyhow::{Context, Result};
use calorie_lens::config::{self, Opt};
use calorie_lens::{web, GeminiClient};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("CALORIE_LENS_LOG")
                .from_env_lossy(),
        )
        .init();

    let opt = Opt::parse();
    let api_key = match config::load_api_key() {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{e}");
            ::std::process::exit(2);
        }
    };

    if let Err(e) = run(opt, api_key).await {
        tracing::error!("ERROR: {e:#}");
        ::std::process::exit(1);
    }
}

async fn run(opt: Opt, api_key: String) -> Result<()> {
    let generator = GeminiClient::new(api_key, opt.model.as_str(), opt.api_base.as_str());
    let app = web::router(Arc::new(generator));

    let listener = tokio::net::TcpListener::bind(opt.socket_addr())
        .await
        .with_context(|| format!("unable to bind {}", opt.socket_addr()))?;

    info!("listening on http://{}", listener.local_addr()?);
    info!(model = %opt.model, "open the page in a browser and upload a food photo");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received, shutting down...");
        })
        .await?;
    Ok(())
}
