use dotenvy::dotenv;
use std::sync::Once;

use crate::models::config::ServerConfig;
use crate::state::AppState;

static INIT: Once = Once::new();

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// State with the night timer disabled, so tests decide when a night ends.
pub fn test_state() -> AppState {
    AppState::with_config(ServerConfig {
        auto_end_night: false,
        ..ServerConfig::default()
    })
}

/// State whose nights end on their own after `seconds`.
pub fn timed_test_state(seconds: u64) -> AppState {
    AppState::with_config(ServerConfig {
        auto_end_night: true,
        night_duration_seconds: seconds,
        ..ServerConfig::default()
    })
}
