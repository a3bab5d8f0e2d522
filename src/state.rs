use crate::kv::FileStore;
use crate::tracker::WeekTracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<WeekTracker<FileStore>>>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(WeekTracker::new(store))),
        }
    }
}
