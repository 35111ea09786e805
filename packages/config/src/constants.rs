// ABOUTME: Environment variable name constants
// ABOUTME: Centralized definitions of all environment variable names used across REVV

// Server
pub const REVV_API_PORT: &str = "REVV_API_PORT";
pub const REVV_API_HOST: &str = "REVV_API_HOST";
pub const PORT: &str = "PORT"; // Legacy, honored by hosting platforms
pub const REVV_CORS_ORIGIN: &str = "REVV_CORS_ORIGIN";

// Storage
pub const REVV_DATABASE_PATH: &str = "REVV_DATABASE_PATH";
pub const REVV_DATA_DIR: &str = "REVV_DATA_DIR";

// Outbound HTTP
pub const REVV_HTTP_TIMEOUT_SECS: &str = "REVV_HTTP_TIMEOUT_SECS";

// Carrier tracking provider
pub const REVV_TRACKING_API_KEY: &str = "REVV_TRACKING_API_KEY";
pub const REVV_TRACKING_API_URL: &str = "REVV_TRACKING_API_URL";

// SMS (Twilio)
pub const TWILIO_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const TWILIO_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const TWILIO_FROM_NUMBER: &str = "TWILIO_FROM_NUMBER";
pub const TWILIO_API_URL: &str = "TWILIO_API_URL";

// Email
pub const REVV_EMAIL_API_KEY: &str = "REVV_EMAIL_API_KEY";
pub const REVV_EMAIL_API_URL: &str = "REVV_EMAIL_API_URL";
pub const REVV_EMAIL_FROM: &str = "REVV_EMAIL_FROM";

// Branding used in customer notifications
pub const REVV_SHOP_NAME: &str = "REVV_SHOP_NAME";

// Defaults
pub const DEFAULT_API_PORT: u16 = 4100;
pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TRACKING_API_URL: &str = "https://api.aftership.com/tracking/2024-10";
pub const DEFAULT_TWILIO_API_URL: &str = "https://api.twilio.com/2010-04-01";
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
pub const DEFAULT_SHOP_NAME: &str = "REVV";
