use crate::counter::Rollover;
use crate::errors::TrackerError;
use crate::queue::StoreHandle;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Installed,
    Startup,
}

pub async fn on_lifecycle(store: &StoreHandle, event: LifecycleEvent) {
    match event {
        LifecycleEvent::Installed => match store.install().await {
            Ok(record) => info!(week = %record.week_id, "tracker installed"),
            Err(err) => error!("install failed: {err}"),
        },
        LifecycleEvent::Startup => {
            info!("tracker started, checking week reset");
            check(store).await;
        }
    }
}

pub fn spawn_rollover_timer(store: StoreHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !check(&store).await {
                warn!("store queue closed, stopping rollover timer");
                break;
            }
        }
    })
}

async fn check(store: &StoreHandle) -> bool {
    match store.check_rollover().await {
        Ok(Rollover::Unchanged) => true,
        Ok(Rollover::Repaired) => {
            warn!("week data was invalid and has been reinitialised");
            true
        }
        Ok(Rollover::Started { previous, archived }) => {
            info!(?previous, ?archived, "week rolled over");
            true
        }
        Err(TrackerError::StoreClosed) => false,
        Err(err) => {
            error!("rollover check failed: {err}");
            true
        }
    }
}
