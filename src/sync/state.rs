//! Serial state tracker
//!
//! Tracks what the router has confirmed from the cache and decides which
//! query the next synchronization needs.

use tokio::time::Instant;
use tracing::{debug, warn};

use super::timers::{SyncTimers, TimerConfig};
use crate::pdu::EndOfData;

/// Serial confirmed by an End of Data PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerialState {
    /// Cache session id.
    pub session_id: u16,
    /// Serial number.
    pub serial: u32,
}

/// Query the next synchronization should issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncQuery {
    /// Incremental update from a known serial.
    Serial(SerialState),
    /// Full reload.
    Reset,
}

/// Synchronization state carried from one session to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Last confirmed serial.
    pub serial: Option<SerialState>,
    /// When it was confirmed.
    pub last_sync: Option<Instant>,
    /// Intervals adopted from the cache, if any.
    pub timers: Option<TimerConfig>,
}

/// Serial and timer state of one session.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    /// Last serial confirmed by End of Data.
    serial: Option<SerialState>,
    /// Refresh/expire deadlines.
    timers: SyncTimers,
    /// Whether `timers` holds intervals from the cache.
    adopted: bool,
}

impl SyncStatus {
    /// Create a status with no synchronization history.
    pub fn new(config: TimerConfig, now: Instant) -> Self {
        Self::resume(config, SyncSnapshot::default(), now)
    }

    /// Create a status continuing from `snapshot`.
    pub fn resume(config: TimerConfig, snapshot: SyncSnapshot, now: Instant) -> Self {
        let adopted = snapshot.timers.is_some();
        let config = snapshot.timers.unwrap_or(config);
        Self {
            serial: snapshot.serial,
            timers: SyncTimers::resume(config, snapshot.last_sync, now),
            adopted,
        }
    }

    /// Last confirmed serial.
    pub fn serial(&self) -> Option<SerialState> {
        self.serial
    }

    /// Timer state.
    pub fn timers(&self) -> &SyncTimers {
        &self.timers
    }

    /// Snapshot for a follow-up session.
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            serial: self.serial,
            last_sync: self.timers.last_sync(),
            timers: self.adopted.then(|| *self.timers.config()),
        }
    }

    /// Record an End of Data PDU.
    ///
    /// This is the only place the serial advances. With `adopt_intervals`
    /// the cache's advertised intervals replace the configured ones when
    /// they are within protocol bounds.
    pub fn on_end_of_data(&mut self, eod: &EndOfData, adopt_intervals: bool, now: Instant) {
        self.serial = Some(SerialState {
            session_id: eod.session_id,
            serial: eod.serial,
        });

        if let Some(intervals) = eod.intervals.filter(|_| adopt_intervals) {
            match TimerConfig::from_intervals(&intervals) {
                Some(config) => {
                    if config != *self.timers.config() {
                        debug!(?config, "adopting cache timing parameters");
                    }
                    self.timers.set_config(config);
                    self.adopted = true;
                }
                None => warn!(?intervals, "ignoring out-of-range cache timing parameters"),
            }
        }

        self.timers.on_end_of_data(now);
    }

    /// Decide the next query, discarding the serial first if it expired.
    pub fn next_query(&mut self, now: Instant) -> SyncQuery {
        if self.timers.is_expired(now) {
            warn!(
                serial = ?self.serial,
                "cached data expired, discarding serial"
            );
            self.serial = None;
            self.timers.clear_sync();
        }

        match self.serial {
            Some(state) => SyncQuery::Serial(state),
            None => SyncQuery::Reset,
        }
    }

    /// Handle the refresh timer firing: re-arm it and pick the query.
    pub fn on_refresh_due(&mut self, now: Instant) -> SyncQuery {
        self.timers.rearm(now);
        self.next_query(now)
    }
}
