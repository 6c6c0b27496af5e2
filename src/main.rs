use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use mssql_explorer::{Cli, ExplorerServer, SchemaCache, TdsExecutor};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays clean for the protocol)
    env_logger::init();

    let config = Arc::new(Cli::parse().into_config());

    let executor = Arc::new(TdsExecutor::connect(&config).await?);
    let cache = Arc::new(SchemaCache::new(config.cache_ttl, config.cache_enabled));

    // Periodic sweep of expired entries. Correctness never depends on it —
    // reads evict lazily — so it runs on its own detached task.
    if config.cache_enabled {
        let sweep_cache = Arc::clone(&cache);
        let sweep_interval = config.cache_ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = sweep_cache.sweep();
                if evicted > 0 {
                    log::debug!("cache sweep evicted {evicted} expired entries");
                }
            }
        });
    }

    let server = ExplorerServer::new(Arc::clone(&config), cache, executor);

    tokio::select! {
        result = server.serve_stdio() => result,
        () = wait_for_interrupt() => {
            log::info!("received interrupt signal, shutting down");
            Ok(())
        }
    }
}

/// Wait for interrupt signal (cross-platform)
#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm_result = signal(SignalKind::terminate());
    let mut sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result.as_mut(), sigint_result.as_mut()) {
        (Ok(sigterm), Ok(sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = sigint.recv() => {}
            }
        }
        (Ok(sigterm), Err(_)) => {
            let _ = sigterm.recv().await;
        }
        (Err(_), Ok(sigint)) => {
            let _ = sigint.recv().await;
        }
        (Err(_), Err(_)) => {
            // If both fail, just wait forever (shouldn't happen)
            let () = std::future::pending().await;
        }
    }
}

/// Wait for interrupt signal (cross-platform)
#[cfg(windows)]
async fn wait_for_interrupt() {
    use tokio::signal::windows;

    match windows::ctrl_c() {
        Ok(mut ctrl_c) => {
            let _ = ctrl_c.recv().await;
        }
        Err(_) => {
            // If ctrl_c fails, wait forever (shouldn't happen)
            let () = std::future::pending().await;
        }
    }
}
