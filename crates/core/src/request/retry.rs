//! Retry policy for the request engine
//!
//! Decides, per response, whether to return, retry after a delay, or fail.
//! Delays are measured in policy units (one second by default) so tests can
//! shrink them.

use std::time::Duration;

use njuns_domain::RetryConfig;

use super::engine::ResponseBody;

/// Statuses retried when the body is not a JSON error document.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 4] = [500, 502, 504, 524];

/// Why a response is being retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    ServerError,
}

/// Outcome of classifying one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Success,
    Retry { delay: Duration, reason: RetryReason },
    Fail,
}

/// Attempt budget and delay schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub unit: Duration,
    pub rate_limit_delay_units: u32,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Policy from the retry section of the configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            unit: config.unit(),
            rate_limit_delay_units: config.rate_limit_delay_units,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }

    /// Same schedule with a different unit.
    #[must_use]
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Override the attempt budget; at least one attempt is made.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Wait before retrying after the 0-based `attempt` failed: `1 + 2 * attempt` units.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt.saturating_mul(2).saturating_add(1))
    }

    /// Wait after a 429 response.
    pub fn rate_limit_delay(&self) -> Duration {
        self.unit.saturating_mul(self.rate_limit_delay_units)
    }

    /// Whether `attempt` (zero-based) is the last one allowed.
    pub fn is_last_attempt(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) >= self.max_attempts
    }

    /// Classify a response observed on the 0-based `attempt`.
    ///
    /// A retryable status whose body is a JSON object carrying an `error`
    /// key is an application error from the server and fails immediately.
    pub fn classify(&self, status: u16, body: &ResponseBody, attempt: u32) -> Disposition {
        if (200..300).contains(&status) {
            return Disposition::Success;
        }
        if status == 429 {
            return Disposition::Retry {
                delay: self.rate_limit_delay(),
                reason: RetryReason::RateLimited,
            };
        }
        if self.retryable_statuses.contains(&status) && !body.has_error_key() {
            return Disposition::Retry {
                delay: self.backoff_delay(attempt),
                reason: RetryReason::ServerError,
            };
        }
        Disposition::Fail
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(body: &str) -> ResponseBody {
        ResponseBody::Text(body.to_string())
    }

    #[test]
    fn backoff_grows_by_two_units() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..4).map(|a| policy.backoff_delay(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 3, 5, 7]);
    }

    #[test]
    fn rate_limit_waits_three_units() {
        let policy = RetryPolicy::default().with_unit(Duration::from_millis(10));
        assert_eq!(
            policy.classify(429, &text(""), 4),
            Disposition::Retry { delay: Duration::from_millis(30), reason: RetryReason::RateLimited }
        );
    }

    #[test]
    fn gateway_errors_retry_unless_json_error_body() {
        let policy = RetryPolicy::default();
        assert!(matches!(policy.classify(502, &text("<html>bad gateway</html>"), 0), Disposition::Retry { .. }));
        assert_eq!(
            policy.classify(500, &ResponseBody::Json(json!({"error": "Server error"})), 0),
            Disposition::Fail
        );
        assert!(matches!(
            policy.classify(500, &ResponseBody::Json(json!({"message": "x"})), 0),
            Disposition::Retry { .. }
        ));
    }

    #[test]
    fn other_statuses_fail_immediately() {
        let policy = RetryPolicy::default();
        for status in [400, 401, 403, 404, 501, 503] {
            assert_eq!(policy.classify(status, &text(""), 0), Disposition::Fail, "status {status}");
        }
        assert_eq!(policy.classify(204, &text(""), 0), Disposition::Success);
    }

    #[test]
    fn zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::from_config(&RetryConfig { max_attempts: 0, ..Default::default() });
        assert_eq!(policy.max_attempts, 1);
        assert!(policy.is_last_attempt(0));
    }
}
