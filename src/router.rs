use crate::handlers::probe::{firebase_probe_handler, health_handler};
use crate::service::firestore::FirestoreDb;
use axum::{Router, routing::get};

/// Process-wide request state. The database handle is immutable after
/// construction, so handlers share it without locking.
#[derive(Clone)]
pub struct FirelinkState {
    pub db: FirestoreDb,
}

impl FirelinkState {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }
}

pub fn firelink_router(state: FirelinkState) -> Router {
    Router::new()
        .route("/api/test/health", get(health_handler))
        .route("/api/test/firebase", get(firebase_probe_handler))
        .with_state(state)
}
