use crate::domain::state::Portal;
use crate::domain::tuning::ArenaTuning;
use rand::Rng;

/// Whether the portal should open now: enough kills, enemies still alive, none open yet.
pub fn should_open(portal: Option<Portal>, kills: u32, threshold: u32, living: usize) -> bool {
    portal.is_none() && living > 0 && kills >= threshold
}

/// Picks one of the cardinal portal spots at random.
pub fn open_at_random_spot<R: Rng + ?Sized>(rng: &mut R, arena: &ArenaTuning) -> Portal {
    let spots = arena.portal_spots();
    let (x, y) = spots[rng.gen_range(0..spots.len())];
    Portal { x, y }
}

pub fn in_reach(portal: &Portal, x: f32, y: f32, radius: f32) -> bool {
    let dx = portal.x - x;
    let dy = portal.y - y;
    dx * dx + dy * dy <= radius * radius
}
