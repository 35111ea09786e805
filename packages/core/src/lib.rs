// ABOUTME: Core types, traits, and utilities for REVV
// ABOUTME: Foundational package providing shared functionality across all REVV packages

pub mod clock;
pub mod constants;
pub mod types;
pub mod utils;

// Re-export main types
pub use types::{Actor, BillingMonth, BillingMonthError, Role, RoleParseError};

// Re-export clocks
pub use clock::{Clock, FixedClock, SystemClock};

// Re-export constants
pub use constants::revv_dir;

// Re-export utilities
pub use utils::{generate_id, non_blank};
