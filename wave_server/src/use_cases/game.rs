use super::types::GameEvent;
use crate::domain::{HitOutcome, MoveOutcome, World, WorldRules, WorldSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tracing::{debug, info};

/// Authoritative loop for one world instance.
///
/// Owns the `World` outright: events from every connection are drained once per tick, the
/// simulation advances by one fixed step, and the resulting snapshot is broadcast.
pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldSnapshot>,
    rules: WorldRules,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut world = World::new(rules);
    let dt = tick_interval.as_secs_f32();

    // Drive the fixed-step game loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // Exit cleanly when the world is removed.
                info!("world task shutting down");
                break;
            }
            _ = interval.tick() => {}
        }

        while let Ok(ev) = input_rx.try_recv() {
            apply_event(&mut world, ev);
        }

        world.tick(dt);

        // No receivers simply means nobody is watching yet.
        let _ = world_tx.send(world.snapshot());
    }
}

/// Routes one connection event into the world.
pub fn apply_event(world: &mut World, ev: GameEvent) {
    match ev {
        GameEvent::Join { player_id, avatar } => world.join(player_id, avatar),
        GameEvent::Leave { player_id } => {
            world.leave(player_id);
        }
        GameEvent::Move { player_id, x, y } => {
            if world.apply_move(player_id, x, y) == MoveOutcome::Rejected {
                debug!(player_id, x, y, "move rejected");
            }
        }
        GameEvent::Hit {
            player_id,
            enemy_id,
            damage,
        } => match world.apply_hit(player_id, enemy_id, damage) {
            HitOutcome::Killed => debug!(player_id, enemy_id, "kill confirmed"),
            HitOutcome::UnknownEnemy | HitOutcome::AlreadyDead => {
                debug!(player_id, enemy_id, "stale hit ignored")
            }
            _ => {}
        },
        GameEvent::Ready { player_id, status } => {
            world.set_ready(player_id, status);
        }
    }
}
