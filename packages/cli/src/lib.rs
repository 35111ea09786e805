// ABOUTME: REVV server binary support: configuration, wiring, and admin commands
// ABOUTME: The `revv` binary in main.rs is a thin clap front end over these modules

pub mod commands;
pub mod config;
pub mod logging;
pub mod server;

pub use config::{Config, ConfigError};
