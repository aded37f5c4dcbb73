/// Wave composition and exit tuning.

#[derive(Debug, Clone, Copy)]
pub struct WaveTuning {
    /// Enemies spawned regardless of wave number.
    pub base: u32,

    /// Extra enemies per wave number.
    pub increment: u32,

    /// Every Nth spawned enemy is ranged; the rest are melee.
    pub ranged_every: u32,

    /// Share of the batch that must die before the portal opens (0.0..=1.0).
    pub portal_kill_ratio: f32,
}

impl WaveTuning {
    /// Total enemies spawned for `wave`: `base + wave * increment`.
    pub fn enemy_count(&self, wave: u32) -> u32 {
        self.base.saturating_add(wave.saturating_mul(self.increment))
    }

    /// Kills required before the portal may spawn for a batch of `batch` enemies.
    pub fn portal_kill_threshold(&self, batch: u32) -> u32 {
        let ratio = self.portal_kill_ratio.clamp(0.0, 1.0);
        ((batch as f32) * ratio).ceil() as u32
    }
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            base: 5,
            increment: 3,
            ranged_every: 3,
            portal_kill_ratio: 0.5,
        }
    }
}
