pub mod game_service;
pub mod night_timer;
pub mod session_directory;
pub mod session_service;
