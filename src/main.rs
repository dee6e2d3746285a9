use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use week_tracker::clock::SystemClock;
use week_tracker::detect::DetectorChain;
use week_tracker::scheduler::{self, LifecycleEvent};
use week_tracker::storage::{JsonFileStore, KeyValueStore};
use week_tracker::{queue, router, AppState, Config, WeekStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let storage = JsonFileStore::open(&config.data_path).await?;
    let fresh = storage.keys().await?.is_empty();
    info!(path = %storage.path().display(), fresh, "using state file");

    let (store, store_task) = queue::spawn(WeekStore::new(storage, SystemClock));
    if fresh {
        scheduler::on_lifecycle(&store, LifecycleEvent::Installed).await;
    }
    scheduler::on_lifecycle(&store, LifecycleEvent::Startup).await;
    let timer = scheduler::spawn_rollover_timer(store.clone(), config.rollover_interval);

    let state = AppState::new(
        store,
        DetectorChain::standard(config.tracked_host.clone()),
        config.weekly_goal,
    );
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    timer.abort();
    let _ = timer.await;
    let _ = store_task.await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
