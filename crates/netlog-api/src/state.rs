use netlog_core::LogExcerpt;
use netlog_engine::InferenceTransport;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

// oldest uploads are dropped past this many
pub const MAX_UPLOADS: usize = 100;

#[derive(Clone, Debug)]
pub struct StoredUpload {
    pub file_name: String,
    pub excerpt: LogExcerpt,
    // arrival order, used for eviction
    pub sequence: u64,
}

pub struct AppState {
    pub transport: Arc<dyn InferenceTransport>,
    pub uploads: RwLock<HashMap<Uuid, StoredUpload>>,
    next_sequence: AtomicU64,
}

impl AppState {
    pub fn new(transport: Arc<dyn InferenceTransport>) -> Self {
        Self {
            transport,
            uploads: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed)
    }
}
