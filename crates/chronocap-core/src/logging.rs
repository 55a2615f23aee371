//! Structured logging field name constants for chronocap.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query by the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), writes |
//! | DEBUG | Decision points, query plans, config choices |
//! | TRACE | Per-item iteration |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "identity"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "capsules", "news", "users", "pool", "cognito"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Capsule id being operated on.
pub const CAPSULE_ID: &str = "capsule_id";

/// News item id being operated on.
pub const NEWS_ID: &str = "news_id";

/// Local user id being operated on.
pub const USER_ID: &str = "user_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Total number of records matching a query before pagination.
pub const TOTAL_ITEMS: &str = "total_items";

/// Number of stages in an aggregation pipeline.
pub const STAGE_COUNT: &str = "stage_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Slow operation threshold exceeded.
pub const SLOW: &str = "slow";

/// Store calls slower than this are logged at WARN with `slow = true`.
pub const SLOW_QUERY_THRESHOLD_MS: u64 = 1000;
