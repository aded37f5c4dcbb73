/// Arena geometry shared by spawning, the portal and the hub exit.

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Half-extent of the square arena in pixels.
    pub half_size: f32,

    /// Distance from the arena edge where enemies spawn.
    pub spawn_margin: f32,

    /// Distance from the arena center to each cardinal portal spot.
    pub portal_offset: f32,

    /// How close a player must be to the portal center to take it.
    pub portal_radius: f32,

    /// Width of the exit strip along the east wall of the hub.
    pub hub_exit_width: f32,

    /// Max hazards attempted per wave.
    pub hazard_count: u32,

    /// Hazards snap to this grid size.
    pub hazard_grid: f32,

    /// Hazards never land this close to a portal spot.
    pub hazard_clearance: f32,

    /// Players join within this distance of the arena center.
    pub join_spread: f32,
}

impl ArenaTuning {
    /// The four spots the portal may open on.
    pub fn portal_spots(&self) -> [(f32, f32); 4] {
        let d = self.portal_offset;
        [(0.0, -d), (0.0, d), (-d, 0.0), (d, 0.0)]
    }

    pub fn in_hub_exit(&self, x: f32, y: f32) -> bool {
        x >= self.half_size - self.hub_exit_width
            && x <= self.half_size
            && y >= -self.half_size
            && y <= self.half_size
    }
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            half_size: 450.0,
            spawn_margin: 30.0,
            portal_offset: 400.0,
            portal_radius: 50.0,
            hub_exit_width: 100.0,
            hazard_count: 8,
            hazard_grid: 50.0,
            hazard_clearance: 80.0,
            join_spread: 50.0,
        }
    }
}
