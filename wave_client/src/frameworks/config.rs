use std::{env, time::Duration};

// Bot runtime constants (not gameplay tuning).

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const BOT_SPEED: f32 = 200.0;
pub const FIRE_COOLDOWN: Duration = Duration::from_millis(250);
pub const FIRE_RANGE: f32 = 300.0;
pub const SHOT_DAMAGE: f32 = 1.0;

const MAX_AVATAR_CHARS: usize = 16;

pub fn server_url() -> String {
    env::var("WAVE_SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:3001/ws".to_string())
}

/// Avatar token for the query string; reduced to URL-safe characters.
pub fn bot_avatar() -> String {
    sanitize_avatar(&env::var("BOT_AVATAR").unwrap_or_default())
}

fn sanitize_avatar(raw: &str) -> String {
    let avatar: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .take(MAX_AVATAR_CHARS)
        .collect();
    if avatar.is_empty() {
        "bot".to_string()
    } else {
        avatar
    }
}

/// Joins the base socket URL with the avatar query, keeping any query already present.
pub fn connect_url(base: &str, avatar: &str) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}avatar={avatar}")
}
