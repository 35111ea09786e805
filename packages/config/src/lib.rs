// ABOUTME: Configuration primitives shared by the REVV binary and services
// ABOUTME: Re-exports environment variable names and their defaults

pub mod constants;

pub use constants::*;
