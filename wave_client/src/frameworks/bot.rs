// Headless bot: connects, walks to the hub exit, fights the wave, takes the portal.

use crate::domain::emitter::ReadyTracker;
use crate::domain::prediction::{self, HUB_EXIT_MAX_X, HUB_EXIT_MIN_X};
use crate::domain::{Phase, SessionStatus, StateMirror};
use crate::frameworks::config;
use crate::interface_adapters::net::{ClientError, ClientSettings, NetClient};

use std::time::Instant;
use tracing::{debug, info};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Where the bot wants to walk this frame.
fn goal(mirror: &StateMirror, pos: (f32, f32)) -> (f32, f32) {
    match mirror.phase() {
        Phase::Hub => ((HUB_EXIT_MIN_X + HUB_EXIT_MAX_X) / 2.0, 0.0),
        Phase::Wave => {
            if let Some(portal) = mirror.portal() {
                return (portal.x, portal.y);
            }
            // Hold position and let targets come within range.
            nearest_enemy(mirror, pos).map_or(pos, |(_, x, y)| (x, y))
        }
    }
}

fn nearest_enemy(mirror: &StateMirror, pos: (f32, f32)) -> Option<(String, f32, f32)> {
    mirror
        .visible_enemies()
        .map(|e| {
            let d = (e.x - pos.0).powi(2) + (e.y - pos.1).powi(2);
            (d, e)
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, e)| (e.id.clone(), e.x, e.y))
}

fn in_exit_zone(mirror: &StateMirror, pos: (f32, f32)) -> bool {
    match mirror.phase() {
        Phase::Hub => prediction::in_hub_exit(pos),
        Phase::Wave => mirror
            .portal()
            .is_some_and(|p| prediction::in_portal(pos, (p.x, p.y))),
    }
}

pub async fn run_bot(url: &str) -> Result<(), ClientError> {
    let mut client = NetClient::new(ClientSettings::default());
    client.connect(url).await?;

    let mut ready = ReadyTracker::default();
    let mut pos: Option<(f32, f32)> = None;
    let mut last_shot = Instant::now() - config::FIRE_COOLDOWN;
    let mut last_wave = 0;

    let mut frame = tokio::time::interval(config::FRAME_INTERVAL);
    let dt = config::FRAME_INTERVAL.as_secs_f32();

    loop {
        frame.tick().await;
        let mirror = client.mirror();
        if mirror.status() != SessionStatus::Connected {
            info!(status = ?mirror.status(), "session over; bot exiting");
            return Ok(());
        }

        // Seed our position from the first snapshot that includes us.
        let Some(current) = pos.or_else(|| mirror.local_player().map(|p| (p.x, p.y))) else {
            continue;
        };

        if mirror.wave() != last_wave {
            last_wave = mirror.wave();
            info!(wave = last_wave, phase = ?mirror.phase(), "wave changed");
        }

        let target = goal(&mirror, current);
        let next = prediction::step(
            current,
            (target.0 - current.0, target.1 - current.1),
            config::BOT_SPEED,
            dt,
        );
        pos = Some(next);
        client.send_move(next.0, next.1)?;

        if let Some(status) = ready.update(mirror.phase(), in_exit_zone(&mirror, next)) {
            debug!(status, "ready edge");
            client.send_ready(status)?;
        }

        if let Some((id, x, y)) = nearest_enemy(&mirror, next) {
            let in_range = (x - next.0).hypot(y - next.1) <= config::FIRE_RANGE;
            if in_range && last_shot.elapsed() >= config::FIRE_COOLDOWN {
                last_shot = Instant::now();
                client.send_hit(&id, config::SHOT_DAMAGE)?;
                let dying = mirror
                    .enemies()
                    .iter()
                    .any(|e| e.id == id && e.hp <= config::SHOT_DAMAGE);
                if dying {
                    client.predict_kill(&id);
                }
            }
        }
    }
}

pub async fn run_with_config() -> Result<(), ClientError> {
    init_runtime();
    let url = config::connect_url(&config::server_url(), &config::bot_avatar());
    info!(url = %url, "starting bot");
    run_bot(&url).await
}
