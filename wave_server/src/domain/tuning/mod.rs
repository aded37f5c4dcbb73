// Gameplay tuning, kept apart from runtime/server configuration.

pub mod arena;
pub mod enemy;
pub mod wave;

pub use arena::ArenaTuning;
pub use enemy::EnemyTuning;
pub use wave::WaveTuning;
