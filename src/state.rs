use crate::detect::DetectorChain;
use crate::queue::StoreHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreHandle,
    pub detectors: Arc<DetectorChain>,
    pub weekly_goal: u64,
}

impl AppState {
    pub fn new(store: StoreHandle, detectors: DetectorChain, weekly_goal: u64) -> Self {
        Self {
            store,
            detectors: Arc::new(detectors),
            weekly_goal,
        }
    }
}
