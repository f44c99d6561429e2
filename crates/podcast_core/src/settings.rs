use std::time::Duration;

use url::Url;

use crate::{EndpointLayout, DEFAULT_TICK};

/// How status polls are spaced and when a run of failures ends the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Failed polls retried in a row; one more failure ends the session.
    pub max_retries: u32,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            max_retries: 3,
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl PollPolicy {
    /// Delay before the next poll after `failures` consecutive failed polls.
    pub fn delay_after_failures(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let exponent = i32::try_from(failures).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.max(1.0).powi(exponent);
        let secs = self.interval.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    pub server: Url,
    pub endpoints: EndpointLayout,
    /// Percent reached by the local ramp right after submission.
    pub upload_ceiling: u8,
    pub upload_ramp: Duration,
    pub progress_animation: Duration,
    pub completion_animation: Duration,
    pub animation_tick: Duration,
    pub poll: PollPolicy,
    pub max_upload_bytes: u64,
    pub require_auth: bool,
}

impl TrackerSettings {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            endpoints: EndpointLayout::Current,
            upload_ceiling: 20,
            upload_ramp: Duration::from_millis(400),
            progress_animation: Duration::from_millis(600),
            completion_animation: Duration::from_millis(800),
            animation_tick: DEFAULT_TICK,
            poll: PollPolicy::default(),
            max_upload_bytes: 50 * 1024 * 1024,
            require_auth: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_then_caps() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay_after_failures(0), Duration::from_secs(1));
        assert_eq!(policy.delay_after_failures(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after_failures(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after_failures(3), Duration::from_secs(8));
        assert_eq!(policy.delay_after_failures(40), Duration::from_secs(8));
    }
}
