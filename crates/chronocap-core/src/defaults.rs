//! Default values shared across crates.

/// Page used when the `page` query parameter is absent or malformed.
pub const DEFAULT_PAGE: u64 = 1;

/// Page size used when `perPage` is absent or malformed.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Display name given to users registered without one.
pub const DEFAULT_USER_NAME: &str = "Noname";

/// Refresh token cookie lifetime (30 days).
pub const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Access and id token cookie lifetime (1 day).
pub const SESSION_COOKIE_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;
