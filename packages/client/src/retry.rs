//! Reconnection policy: bounded attempts, fixed delay.
//!
//! Pure functions so the give-up behavior is deterministic and testable
//! without a network.

use crate::error::ClientError;

/// Maximum consecutive failed connection attempts before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Fixed delay between attempts, in milliseconds.
pub const RECONNECT_DELAY_MILLIS: u64 = 1_000;

/// Errors that no amount of retrying can fix.
pub fn is_terminal(error: &ClientError) -> bool {
    matches!(error, ClientError::Unauthorized)
}

/// Whether another attempt should be made after a failure.
///
/// `attempts_used` counts consecutive failures in the current series; a
/// session that was successfully established resets the series.
pub fn should_retry(error: &ClientError, attempts_used: u32, max_attempts: u32) -> bool {
    !is_terminal(error) && attempts_used < max_attempts
}

/// The failure count after `error`, given `attempts_used` so far. Losing an
/// established connection starts a fresh series.
pub fn next_attempt_count(error: &ClientError, attempts_used: u32) -> u32 {
    match error {
        ClientError::ConnectionLost(_) => 1,
        _ => attempts_used + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_terminal() {
        assert!(is_terminal(&ClientError::Unauthorized));
        assert!(!is_terminal(&ClientError::ConnectFailed("refused".into())));
        assert!(!is_terminal(&ClientError::ConnectionLost("reset".into())));
    }

    #[test]
    fn never_retries_a_terminal_error() {
        assert!(!should_retry(&ClientError::Unauthorized, 0, 5));
    }

    #[test]
    fn retries_until_the_budget_is_used_up() {
        let error = ClientError::ConnectFailed("refused".into());
        assert!(should_retry(&error, 1, 5));
        assert!(should_retry(&error, 4, 5));
        assert!(!should_retry(&error, 5, 5));
    }

    #[test]
    fn losing_an_established_session_resets_the_series() {
        assert_eq!(
            next_attempt_count(&ClientError::ConnectionLost("reset".into()), 4),
            1
        );
        assert_eq!(
            next_attempt_count(&ClientError::ConnectFailed("refused".into()), 4),
            5
        );
    }
}
