use crate::use_cases::WorldRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Registry of live worlds keyed by id.
    pub world_registry: Arc<WorldRegistry>,
    // World used when a client connects without `world_id`.
    pub default_world_id: Arc<str>,
}
