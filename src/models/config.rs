use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub allowed_origin: String,
    // How long a night lasts before it is resolved regardless of missing actions
    pub night_duration_seconds: u64,
    // Whether the night timer is armed at all
    pub auto_end_night: bool,
    pub code_length: usize,
    pub max_code_attempts: usize,
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            night_duration_seconds: 30,
            auto_end_night: true,
            code_length: 6,
            max_code_attempts: 32,
            channel_capacity: 1000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = env::var("SERVER_ADDR").unwrap_or(defaults.addr);
        let allowed_origin = env::var("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin);
        let night_duration_seconds = env::var("NIGHT_DURATION_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.night_duration_seconds);
        let auto_end_night = env::var("AUTO_END_NIGHT")
            .map(|v| v == "true")
            .unwrap_or(defaults.auto_end_night);
        let code_length = env::var("CODE_LENGTH")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&len| len > 0)
            .unwrap_or(defaults.code_length);
        let max_code_attempts = env::var("MAX_CODE_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.max_code_attempts);
        let channel_capacity = env::var("CHANNEL_CAPACITY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&cap| cap > 0)
            .unwrap_or(defaults.channel_capacity);

        Self {
            addr,
            allowed_origin,
            night_duration_seconds,
            auto_end_night,
            code_length,
            max_code_attempts,
            channel_capacity,
        }
    }

    pub fn night_duration(&self) -> Duration {
        Duration::from_secs(self.night_duration_seconds)
    }
}
