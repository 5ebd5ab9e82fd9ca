use tracing_subscriber::EnvFilter;

use plinth::prelude::*;
use plinth::{api, assets, render};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run() {
        tracing::error!("startup failed: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run() -> Result<(), PlinthError> {
    let config = Config::load()?;

    // Fail fast: no assets or no working engine means no traffic.
    if assets::is_empty() {
        return Err(PlinthError::EmptyAssetBundle);
    }
    let source = render::load_entry_point(&config.engine.path)?;
    let renderer = RenderPool::new(&config.engine, &source, config.debug)?;

    tracing::info!(
        commit = %config.commit_hash,
        debug = config.debug,
        "starting plinth"
    );

    let api_prefix = config.api.prefix.clone();
    let router = Router::new()
        .middleware(LoggingMiddleware::new())
        .middleware(CatchPanicMiddleware::new())
        .get("/favicon.ico", Favicon)
        .push(api::routes(&api_prefix))
        .fallback(Dispatch);

    App::new(AppState { config, renderer })
        .router(router)
        .listen()
        .await
}
