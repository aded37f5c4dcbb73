// Use cases layer: application workflows for the wave server.

pub mod game;
pub mod registry;
pub mod types;

pub use registry::{WorldError, WorldHandle, WorldRegistry, WorldSettings, spawn_idle_reaper};
pub use types::GameEvent;
