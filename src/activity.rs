//! Link activity tracking
//!
//! The dispatcher [records](ActivityMarker::record) every actuator or servo
//! command. Once per main loop iteration, the [`ActivityMachine`] consumes
//! that record: a pending event wakes a sleeping link, and a link that sees
//! no activity for longer than the idle window goes back to sleep.
//!
//! ```text
//!            pending
//!   Sleep ------------> Wake
//!     ^                  |
//!     +------------------+
//!      now - last > idle window
//! ```

use crate::clock;

/// Visibility of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No recent commands. Indicator off.
    #[default]
    Sleep,
    /// Commands arrived within the idle window. Indicator on.
    Wake,
}

/// The most recent command activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityMarker {
    pending: bool,
    last_activity_ms: u32,
}

impl ActivityMarker {
    /// No activity, stamped at time zero.
    pub const fn new() -> Self {
        Self {
            pending: false,
            last_activity_ms: 0,
        }
    }

    /// Record activity at `now`.
    ///
    /// Repeated records before the next [`take()`](ActivityMarker::take)
    /// collapse into one event with the latest timestamp.
    pub fn record(&mut self, now: u32) {
        self.pending = true;
        self.last_activity_ms = now;
    }

    /// Indicates if activity awaits a telemetry reply.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Time of the latest activity.
    pub fn last_activity_ms(&self) -> u32 {
        self.last_activity_ms
    }

    /// Clear the pending flag, returning its previous value.
    pub fn take(&mut self) -> bool {
        core::mem::replace(&mut self.pending, false)
    }
}

/// A change of [`LinkState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// `Sleep` to `Wake`. Assert the indicator.
    Woke,
    /// `Wake` to `Sleep`. Deassert the indicator.
    Slept,
}

/// The Sleep / Wake state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActivityMachine {
    state: LinkState,
    idle_window_ms: u32,
}

impl ActivityMachine {
    /// A sleeping machine that sleeps again after `idle_window_ms` without activity.
    pub const fn new(idle_window_ms: u32) -> Self {
        Self {
            state: LinkState::Sleep,
            idle_window_ms,
        }
    }

    /// Current state. Starts as [`LinkState::Sleep`].
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Idleness, in milliseconds, tolerated before the link sleeps.
    pub fn idle_window_ms(&self) -> u32 {
        self.idle_window_ms
    }

    /// React to pending activity.
    ///
    /// Returns `Some(Transition::Woke)` if this woke the link. Does nothing
    /// when already awake.
    pub fn wake(&mut self) -> Option<Transition> {
        match self.state {
            LinkState::Sleep => {
                self.state = LinkState::Wake;
                Some(Transition::Woke)
            }
            LinkState::Wake => None,
        }
    }

    /// Sleep if the link has been idle for longer than the idle window.
    ///
    /// Returns `Some(Transition::Slept)` if this put the link to sleep.
    pub fn expire(&mut self, now: u32, last_activity_ms: u32) -> Option<Transition> {
        match self.state {
            LinkState::Wake if clock::elapsed(last_activity_ms, now) > self.idle_window_ms => {
                self.state = LinkState::Sleep;
                Some(Transition::Slept)
            }
            _ => None,
        }
    }
}
