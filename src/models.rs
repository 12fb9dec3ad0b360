pub mod assignment;
pub mod config;
pub mod error;
pub mod night;
pub mod notification;
pub mod player;
pub mod role;
pub mod session;
pub mod view;
pub mod voting;
pub mod win_condition;
