//! Widget session accounting.
//!
//! A customer's session count goes up when they reconnect after being
//! away for longer than [`SESSION_GAP_MINUTES`]. Reconnects inside the
//! window belong to the same session.

use chrono::Duration;

use crate::types::Timestamp;

/// Idle time after which a reconnect counts as a new session.
pub const SESSION_GAP_MINUTES: i64 = 30;

/// Session count given to a freshly created customer.
pub const INITIAL_SESSION_COUNT: i32 = 1;

pub fn session_gap() -> Duration {
    Duration::minutes(SESSION_GAP_MINUTES)
}

/// Returns `true` when a connect at `now` opens a new session for a
/// customer last seen at `last_seen_at`.
///
/// The gap must be strictly greater than [`SESSION_GAP_MINUTES`].
pub fn starts_new_session(last_seen_at: Timestamp, now: Timestamp) -> bool {
    now - last_seen_at > session_gap()
}

/// Latest `last_seen_at` that still counts as a new session at `now`.
///
/// Stores use this as the bound of an atomic conditional increment:
/// `last_seen_at < session_cutoff(now)` is equivalent to
/// [`starts_new_session`].
pub fn session_cutoff(now: Timestamp) -> Timestamp {
    now - session_gap()
}
