// Client-side domain: the mirrored world and intent shaping.

pub mod emitter;
pub mod mirror;
pub mod prediction;

pub use mirror::{
    EnemyKind, EnemyView, HazardView, Phase, PlayerView, PortalView, SessionStatus, Snapshot,
    StateMirror,
};
