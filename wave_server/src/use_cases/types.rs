// Use-case level inputs for the world loop.

#[derive(Debug, Clone)]
pub enum GameEvent {
    Join { player_id: u64, avatar: String },
    Leave { player_id: u64 },
    Move { player_id: u64, x: f32, y: f32 },
    Hit { player_id: u64, enemy_id: u64, damage: f32 },
    Ready { player_id: u64, status: bool },
}
