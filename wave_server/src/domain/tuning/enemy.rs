use crate::domain::state::EnemyKind;

/// Gameplay tuning for enemies.
///
/// Speeds are in pixels per second; the browser client historically moved enemies by a fixed
/// amount per 60 Hz frame, so these are those per-frame values scaled by 60.
#[derive(Debug, Clone, Copy)]
pub struct EnemyTuning {
    pub melee_hp: f32,
    pub melee_speed: f32,
    pub ranged_hp: f32,
    pub ranged_speed: f32,
}

impl EnemyTuning {
    pub fn hp(&self, kind: EnemyKind) -> f32 {
        match kind {
            EnemyKind::Melee => self.melee_hp,
            EnemyKind::Ranged => self.ranged_hp,
        }
    }

    pub fn speed(&self, kind: EnemyKind) -> f32 {
        match kind {
            EnemyKind::Melee => self.melee_speed,
            EnemyKind::Ranged => self.ranged_speed,
        }
    }
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            melee_hp: 3.0,
            melee_speed: 90.0,
            ranged_hp: 1.0,
            ranged_speed: 48.0,
        }
    }
}
