//! Rankboard HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;

use rankboard::cache::{
    CacheBackend, CacheKind, InMemoryRankCache, RankCache, RedisRankCache, WarmState,
};
use rankboard::config::Config;
use rankboard::constants::LEADERBOARD_KEY;
use rankboard::gateway::{HandlerState, create_router_with_state, check_health};
use rankboard::pipeline::UpdatePipeline;
use rankboard::store::PgScoreStore;
use rankboard::sync::CacheSynchronizer;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

type Pipeline = UpdatePipeline<PgScoreStore, CacheBackend>;

fn main() -> anyhow::Result<()> {
    // Decided before any runtime exists; the health check builds its own.
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve())
}

async fn serve() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        cache_backend = %config.cache_backend,
        "Rankboard starting"
    );

    let store = PgScoreStore::connect(&config.database_url, config.db_pool_size)?;
    store.ensure_schema().await?;

    let cache = build_cache(&config).await;
    let warm = WarmState::new();

    let pipeline = Arc::new(UpdatePipeline::start(
        config.pipeline_config(),
        store.clone(),
        cache.clone(),
    )?);

    let synchronizer = Arc::new(
        CacheSynchronizer::new(store.clone(), cache.clone(), warm.clone())
            .with_batch_size(config.sync_batch_size),
    );

    let mut background: Vec<JoinHandle<()>> = Vec::new();
    if synchronizer.is_enabled() {
        background.push(Arc::clone(&synchronizer).spawn_initial());
        if let Some(period) = config.resync_interval() {
            tracing::info!(period_secs = period.as_secs(), "Periodic cache resync enabled");
            background.push(Arc::clone(&synchronizer).start_periodic(period));
        }
    } else {
        tracing::warn!("Running without a cache, all reads go to the database");
    }

    if let Some(period) = config.simulate_interval() {
        tracing::info!(
            period_secs = period.as_secs(),
            count = config.simulate_count,
            "Simulated score updates enabled"
        );
        background.push(start_simulation(
            Arc::clone(&pipeline),
            period,
            config.simulate_count,
        ));
    }

    let state = HandlerState::new(store, cache, warm, Arc::clone(&pipeline), synchronizer);
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    for handle in &background {
        handle.abort();
    }

    tracing::info!("Draining update queue...");
    pipeline.shutdown().await;

    tracing::info!("Rankboard shutdown complete");
    Ok(())
}

/// Connects the configured cache. Any failure means running without one.
async fn build_cache(config: &Config) -> Option<CacheBackend> {
    match config.cache_backend {
        CacheKind::None => None,
        CacheKind::Memory => Some(CacheBackend::Memory(InMemoryRankCache::new())),
        CacheKind::Redis => {
            let cache = match RedisRankCache::connect(&config.redis_url, LEADERBOARD_KEY).await {
                Ok(cache) => cache,
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, continuing without cache");
                    return None;
                }
            };
            if let Err(e) = cache.ping().await {
                tracing::warn!(error = %e, "Redis ping failed, continuing without cache");
                return None;
            }
            tracing::info!(url = %config.redis_url, key = LEADERBOARD_KEY, "Redis cache connected");
            Some(CacheBackend::Redis(cache))
        }
    }
}

fn start_simulation(pipeline: Arc<Pipeline>, period: Duration, count: usize) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = pipeline.simulate_random_updates(count).await {
                tracing::warn!(error = %e, "Simulated update batch failed");
            }
        }
    })
}

fn run_health_check() -> i32 {
    let port = std::env::var("RANKBOARD_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(_) => return 1,
    };

    if rt.block_on(check_health(port)) { 0 } else { 1 }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
