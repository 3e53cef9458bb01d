use std::sync::Arc;

use coinvault::coins::{self, CoinRepository, InMemoryCoinStore};
use coinvault::config::Config;
use coinvault::router::{Router, RouterOptions};
use coinvault::server::Listener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    let store: Arc<dyn CoinRepository> = Arc::new(InMemoryCoinStore::new());
    let router = Router::builder()
        .options(RouterOptions::from(&cfg))
        .extend(coins::routes(store)?)
        .build();

    let listener = Listener::bind(cfg.server.clone(), Arc::new(router)).await?;
    let shutdown = listener.shutdown_handle();

    let mut server = tokio::spawn(listener.run());

    tokio::select! {
        res = &mut server => {
            res??;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            shutdown.shutdown();
            server.await??;
        }
    }

    Ok(())
}
