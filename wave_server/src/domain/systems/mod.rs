// Per-tick simulation systems operating on plain domain state.

pub mod combat;
pub mod hazards;
pub mod phase;
pub mod portal;
pub mod pursuit;
pub mod spawning;
