//! Refresh, retry and expire timers.
//!
//! Implements the timing model of RFC 8210 section 6:
//!
//! - **Refresh**: poll the cache this long after the last End of Data
//! - **Retry**: wait this long before reconnecting after a failure
//! - **Expire**: discard data this long after the last End of Data

use std::time::Duration;

use tokio::time::Instant;

use crate::core::{
    ConfigError, DEFAULT_EXPIRE_INTERVAL, DEFAULT_REFRESH_INTERVAL, DEFAULT_RETRY_INTERVAL,
    EXPIRE_RANGE_SECS, REFRESH_RANGE_SECS, RETRY_RANGE_SECS,
};
use crate::pdu::Intervals;

/// The three synchronization intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// Time between refresh queries.
    pub refresh: Duration,
    /// Time to wait before reconnecting.
    pub retry: Duration,
    /// Maximum age of synchronized data.
    pub expire: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            refresh: DEFAULT_REFRESH_INTERVAL,
            retry: DEFAULT_RETRY_INTERVAL,
            expire: DEFAULT_EXPIRE_INTERVAL,
        }
    }
}

impl TimerConfig {
    /// Create a timer configuration.
    pub fn new(refresh: Duration, retry: Duration, expire: Duration) -> Self {
        Self {
            refresh,
            retry,
            expire,
        }
    }

    /// Check that all intervals are positive, within the RFC 8210 maxima,
    /// and that expire is the longest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh.is_zero() {
            return Err(ConfigError::ZeroInterval("refresh"));
        }
        if self.retry.is_zero() {
            return Err(ConfigError::ZeroInterval("retry"));
        }
        if self.expire.is_zero() {
            return Err(ConfigError::ZeroInterval("expire"));
        }
        for (name, value, (_, max)) in [
            ("refresh", self.refresh, REFRESH_RANGE_SECS),
            ("retry", self.retry, RETRY_RANGE_SECS),
            ("expire", self.expire, EXPIRE_RANGE_SECS),
        ] {
            if value > Duration::from_secs(max.into()) {
                return Err(ConfigError::IntervalTooLong {
                    name,
                    max_secs: max,
                });
            }
        }
        if self.expire < self.refresh {
            return Err(ConfigError::ExpireTooShort("refresh"));
        }
        if self.expire < self.retry {
            return Err(ConfigError::ExpireTooShort("retry"));
        }
        Ok(())
    }

    /// Build from the intervals a cache advertised in End of Data.
    ///
    /// Returns `None` unless every value lies in its RFC 8210 range and
    /// expire exceeds both refresh and retry.
    pub fn from_intervals(intervals: &Intervals) -> Option<Self> {
        let in_range = |value: u32, (min, max): (u32, u32)| (min..=max).contains(&value);
        if !in_range(intervals.refresh, REFRESH_RANGE_SECS)
            || !in_range(intervals.retry, RETRY_RANGE_SECS)
            || !in_range(intervals.expire, EXPIRE_RANGE_SECS)
            || intervals.expire <= intervals.refresh
            || intervals.expire <= intervals.retry
        {
            return None;
        }

        Some(Self {
            refresh: Duration::from_secs(intervals.refresh.into()),
            retry: Duration::from_secs(intervals.retry.into()),
            expire: Duration::from_secs(intervals.expire.into()),
        })
    }
}

/// Deadline bookkeeping for one synchronization relationship.
#[derive(Debug, Clone)]
pub struct SyncTimers {
    /// Active intervals.
    config: TimerConfig,
    /// When the last End of Data arrived.
    last_sync: Option<Instant>,
    /// When the next refresh query is due.
    next_refresh: Instant,
}

impl SyncTimers {
    /// Create timers with no synchronization history.
    pub fn new(config: TimerConfig, now: Instant) -> Self {
        Self::resume(config, None, now)
    }

    /// Create timers continuing from an earlier synchronization.
    pub fn resume(config: TimerConfig, last_sync: Option<Instant>, now: Instant) -> Self {
        Self {
            config,
            last_sync,
            next_refresh: deadline_after(now, config.refresh),
        }
    }

    /// Active intervals.
    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Replace the active intervals. Takes effect at the next re-arm.
    pub fn set_config(&mut self, config: TimerConfig) {
        self.config = config;
    }

    /// When the last End of Data arrived.
    pub fn last_sync(&self) -> Option<Instant> {
        self.last_sync
    }

    /// When the next refresh query is due.
    pub fn refresh_deadline(&self) -> Instant {
        self.next_refresh
    }

    /// Whether the refresh deadline has passed.
    pub fn is_refresh_due(&self, now: Instant) -> bool {
        now >= self.next_refresh
    }

    /// When the synchronized data expires, if there is any and the
    /// deadline is representable.
    pub fn expires_at(&self) -> Option<Instant> {
        self.last_sync.and_then(|at| at.checked_add(self.config.expire))
    }

    /// Whether the synchronized data is older than the expire interval.
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at().is_some_and(|deadline| now >= deadline)
    }

    /// Record a completed synchronization and restart the refresh timer.
    pub fn on_end_of_data(&mut self, now: Instant) {
        self.last_sync = Some(now);
        self.rearm(now);
    }

    /// Restart the refresh timer from `now`.
    pub fn rearm(&mut self, now: Instant) {
        self.next_refresh = deadline_after(now, self.config.refresh);
    }

    /// Forget the last synchronization.
    pub fn clear_sync(&mut self) {
        self.last_sync = None;
    }

    /// How long to wait before reconnecting.
    pub fn retry_interval(&self) -> Duration {
        self.config.retry
    }
}

/// `now + interval`, saturating to a point far enough out to never fire.
fn deadline_after(now: Instant, interval: Duration) -> Instant {
    now.checked_add(interval)
        .unwrap_or_else(|| now + FAR_FUTURE)
}

/// Roughly thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TimerConfig {
        TimerConfig::new(
            Duration::from_secs(10),
            Duration::from_secs(5),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_timer_config_validate() {
        assert!(TimerConfig::default().validate().is_ok());
        assert!(test_config().validate().is_ok());

        let zero = TimerConfig::new(Duration::ZERO, Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(zero.validate(), Err(ConfigError::ZeroInterval("refresh")));

        let short = TimerConfig::new(
            Duration::from_secs(60),
            Duration::from_secs(1),
            Duration::from_secs(30),
        );
        assert_eq!(short.validate(), Err(ConfigError::ExpireTooShort("refresh")));
    }

    #[test]
    fn test_timer_config_rejects_oversized_intervals() {
        let huge = TimerConfig::new(Duration::MAX, Duration::from_secs(1), Duration::MAX);
        assert_eq!(
            huge.validate(),
            Err(ConfigError::IntervalTooLong {
                name: "refresh",
                max_secs: 86_400
            })
        );

        let retry = TimerConfig::new(
            Duration::from_secs(60),
            Duration::from_secs(7_201),
            Duration::from_secs(10_000),
        );
        assert_eq!(
            retry.validate(),
            Err(ConfigError::IntervalTooLong {
                name: "retry",
                max_secs: 7_200
            })
        );
    }

    #[test]
    fn test_unvalidated_huge_intervals_do_not_overflow() {
        let start = Instant::now();
        let huge = TimerConfig::new(Duration::MAX, Duration::MAX, Duration::MAX);
        let mut timers = SyncTimers::new(huge, start);

        assert!(!timers.is_refresh_due(start + Duration::from_secs(86_400 * 365)));
        timers.on_end_of_data(start);
        assert_eq!(timers.expires_at(), None);
        assert!(!timers.is_expired(start + Duration::from_secs(86_400 * 365)));
    }

    #[test]
    fn test_from_intervals_ranges() {
        let ok = Intervals {
            refresh: 120,
            retry: 60,
            expire: 3600,
        };
        assert_eq!(
            TimerConfig::from_intervals(&ok),
            Some(TimerConfig::new(
                Duration::from_secs(120),
                Duration::from_secs(60),
                Duration::from_secs(3600)
            ))
        );

        let expire_too_small = Intervals { expire: 300, ..ok };
        assert_eq!(TimerConfig::from_intervals(&expire_too_small), None);

        let refresh_zero = Intervals { refresh: 0, ..ok };
        assert_eq!(TimerConfig::from_intervals(&refresh_zero), None);

        let refresh_above_expire = Intervals {
            refresh: 7200,
            ..ok
        };
        assert_eq!(TimerConfig::from_intervals(&refresh_above_expire), None);
    }

    #[test]
    fn test_refresh_deadline_rearms() {
        let start = Instant::now();
        let mut timers = SyncTimers::new(test_config(), start);

        assert_eq!(timers.refresh_deadline(), start + Duration::from_secs(10));
        assert!(!timers.is_refresh_due(start + Duration::from_secs(9)));
        assert!(timers.is_refresh_due(start + Duration::from_secs(10)));

        let later = start + Duration::from_secs(10);
        timers.rearm(later);
        assert_eq!(timers.refresh_deadline(), later + Duration::from_secs(10));
    }

    #[test]
    fn test_expiry_tracks_last_end_of_data() {
        let start = Instant::now();
        let mut timers = SyncTimers::new(test_config(), start);

        // Never synchronized, nothing to expire.
        assert!(!timers.is_expired(start + Duration::from_secs(3600)));

        timers.on_end_of_data(start);
        assert!(!timers.is_expired(start + Duration::from_secs(29)));
        assert!(timers.is_expired(start + Duration::from_secs(30)));

        timers.on_end_of_data(start + Duration::from_secs(20));
        assert!(!timers.is_expired(start + Duration::from_secs(30)));

        timers.clear_sync();
        assert_eq!(timers.expires_at(), None);
    }

    #[test]
    fn test_resume_keeps_expire_clock() {
        let start = Instant::now();
        let timers = SyncTimers::resume(test_config(), Some(start), start + Duration::from_secs(25));
        assert!(timers.is_expired(start + Duration::from_secs(30)));
        assert_eq!(timers.retry_interval(), Duration::from_secs(5));
    }
}
