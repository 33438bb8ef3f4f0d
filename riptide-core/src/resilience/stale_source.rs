//! Source book staleness detection.
//!
//! Detects when a quoting engine's source-of-truth book has stopped
//! receiving updates — the upstream exchange connection dropped, the
//! event bus subscriber queue backed up, or the venue itself went quiet.
//! Trading on a stale book is worse than not trading at all, so a tripped
//! breaker forces every side of the quoting engine to `Paused` (§4.4.1).

use std::time::{Duration, Instant};

/// Configuration for source staleness detection. The default baseline is
/// 500ms, matching a market that normally updates every ~250ms — twice the
/// expected inter-update interval before declaring staleness.
#[derive(Debug, Clone)]
pub struct StaleSourceConfig {
    /// Maximum age of the book before it is considered stale.
    pub max_age: Duration,
    /// Maximum number of consecutive empty polls before considered offline.
    pub max_empty_polls: u64,
}

impl Default for StaleSourceConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_millis(500),
            max_empty_polls: 1000,
        }
    }
}

impl StaleSourceConfig {
    /// Builds a config from an instrument's expected update interval, per
    /// the 2x-interval rule.
    pub fn from_expected_interval(expected_interval: Duration) -> Self {
        Self {
            max_age: expected_interval * 2,
            ..Self::default()
        }
    }
}

/// State of the staleness detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleSourceState {
    /// Book is fresh, quoting may proceed.
    Fresh,
    /// Book has not updated within `max_age`, quoting must pause.
    Stale,
    /// The feed has gone quiet for `max_empty_polls` consecutive checks.
    Offline,
}

/// Detects source book staleness and signals the quoting engine to pause.
#[derive(Debug)]
pub struct StaleSourceBreaker {
    config: StaleSourceConfig,
    state: StaleSourceState,
    last_update: Instant,
    consecutive_empty_polls: u64,
}

impl StaleSourceBreaker {
    pub fn new(config: StaleSourceConfig) -> Self {
        Self {
            config,
            state: StaleSourceState::Fresh,
            last_update: Instant::now(),
            consecutive_empty_polls: 0,
        }
    }

    #[inline(always)]
    pub fn is_fresh(&self) -> bool {
        self.state == StaleSourceState::Fresh
    }

    /// Reports that a book update arrived. Resets staleness counters.
    #[inline]
    pub fn mark_fresh(&mut self) {
        self.last_update = Instant::now();
        self.consecutive_empty_polls = 0;
        self.state = StaleSourceState::Fresh;
    }

    /// Reports a poll that produced no update. Call on every quoting-engine
    /// tick when there was nothing new from the source book.
    #[inline]
    pub fn mark_empty_poll(&mut self) {
        self.consecutive_empty_polls += 1;

        if self.consecutive_empty_polls > self.config.max_empty_polls {
            self.state = StaleSourceState::Offline;
            return;
        }

        if self.last_update.elapsed() > self.config.max_age {
            self.state = StaleSourceState::Stale;
        }
    }

    pub fn state(&self) -> StaleSourceState {
        self.state
    }

    pub fn is_stale(&self) -> bool {
        self.state == StaleSourceState::Stale
    }

    /// Re-evaluates staleness purely from elapsed time since the last
    /// update and returns whether the book is still fresh. Unlike
    /// [`Self::mark_empty_poll`] this does not count toward
    /// `max_empty_polls`; it is the check a quoting engine makes on every
    /// tick before deriving a fair value; staleness detected this way never
    /// escalates to `Offline` on its own.
    pub fn check_freshness(&mut self) -> bool {
        if self.state != StaleSourceState::Offline && self.last_update.elapsed() > self.config.max_age {
            self.state = StaleSourceState::Stale;
        }
        self.is_fresh()
    }

    pub fn is_offline(&self) -> bool {
        self.state == StaleSourceState::Offline
    }

    pub fn time_since_update(&self) -> Duration {
        self.last_update.elapsed()
    }

    pub fn reset(&mut self) {
        self.last_update = Instant::now();
        self.consecutive_empty_polls = 0;
        self.state = StaleSourceState::Fresh;
    }
}
