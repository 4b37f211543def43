//! Session auto-lock state machine.
//!
//! The app re-locks protected notes after it has been in the background
//! for a grace period. The deadline lives inside the machine, so rapid
//! foreground/background flapping cannot leave a stale timer behind.

use chrono::{DateTime, Duration, Utc};
use log::debug;

/// Seconds the app may stay backgrounded before the session re-locks.
pub const DEFAULT_LOCK_GRACE_SECS: i64 = 10;

/// Lock status of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Protected content is hidden until the user re-authenticates.
    Locked,
    /// The user has unlocked this session.
    Unlocked,
    /// The app left the foreground while unlocked; locks at `deadline`
    /// unless it returns first.
    PendingLock { deadline: DateTime<Utc> },
}

/// Drives [`LockState`] from app lifecycle events and timer ticks.
#[derive(Debug, Clone)]
pub struct SessionLock {
    state: LockState,
    grace: Duration,
}

impl Default for SessionLock {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_LOCK_GRACE_SECS))
    }
}

impl SessionLock {
    pub fn new(grace: Duration) -> Self {
        Self {
            state: LockState::Locked,
            grace,
        }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, LockState::Unlocked)
    }

    /// The user authenticated (e.g. entered the correct PIN).
    pub fn unlock(&mut self) {
        self.state = LockState::Unlocked;
    }

    /// Manual re-lock (sign-out or explicit lock).
    pub fn reset(&mut self) {
        debug!("session re-locked");
        self.state = LockState::Locked;
    }

    /// The app left the foreground. Starts the grace countdown when the
    /// session is unlocked; a second transition while already pending
    /// keeps the original deadline.
    pub fn backgrounded(&mut self, now: DateTime<Utc>) {
        if let LockState::Unlocked = self.state {
            self.state = LockState::PendingLock {
                deadline: now + self.grace,
            };
        }
    }

    /// The app returned to the foreground before the deadline passed.
    pub fn foregrounded(&mut self, now: DateTime<Utc>) {
        if let LockState::PendingLock { deadline } = self.state {
            self.state = if now < deadline {
                LockState::Unlocked
            } else {
                LockState::Locked
            };
        }
    }

    /// Timer tick. Locks once the deadline has passed.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        if let LockState::PendingLock { deadline } = self.state {
            if now >= deadline {
                self.reset();
            }
        }
    }
}
