#![cfg(not(tarpaulin_include))]

use proto_news::app;
use proto_news::config::Config;

/// Entry point of the development backend
///
/// Serves `GET /api/articles`, `GET /api/health` and the static front end.
/// Settings come from `HOST`, `PORT`, `PUBLIC_DIR` and `ARTICLES_FILE`;
/// log verbosity from `RUST_LOG`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    println!("Starting Proto backend on http://{}", config.address());
    app::run(config).await
}
