//! Turns noisy per-frame detections into a rate-limited alert decision.
//!
//! Every observation lands in a short FIFO window. Once the window holds at
//! least `min_samples` entries and the share of positive samples is strictly
//! above `alert_ratio`, an alert fires unless the previous alert is younger
//! than `cooldown`. Firing clears the window and re-arms the cooldown, which
//! is only checked on the next observation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::states::{CooldownPhase, CooldownState, DebounceWindow};

pub const DEFAULT_CAPACITY: usize = 5;
pub const DEFAULT_MIN_SAMPLES: usize = 3;
pub const DEFAULT_ALERT_RATIO: f32 = 0.5;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct DebouncerConfig {
    /// Maximum number of samples kept in the window.
    pub capacity: usize,
    /// Samples required before any decision is made.
    pub min_samples: usize,
    /// Positive share that must be strictly exceeded.
    pub alert_ratio: f32,
    /// Minimum interval between two alerts.
    pub cooldown: Duration,
}

impl Default for DebouncerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            min_samples: DEFAULT_MIN_SAMPLES,
            alert_ratio: DEFAULT_ALERT_RATIO,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl DebouncerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::InvalidConfig("capacity must be at least 1".into()));
        }
        if self.min_samples == 0 || self.min_samples > self.capacity {
            return Err(Error::InvalidConfig(format!(
                "min samples must be within 1..={}, got {}",
                self.capacity, self.min_samples
            )));
        }
        if !(0.0..1.0).contains(&self.alert_ratio) {
            return Err(Error::InvalidConfig(format!(
                "alert ratio must be within [0, 1), got {}",
                self.alert_ratio
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Alert,
    NoAlert,
}

/// Outcome of one observation. `ratio` and `window_len` describe the window
/// the decision was taken on, before any post-alert clearing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertDecision {
    pub decision: Decision,
    pub ratio: f32,
    pub window_len: usize,
}

impl AlertDecision {
    pub fn is_alert(&self) -> bool {
        self.decision == Decision::Alert
    }
}

pub struct AlertDebouncer<C> {
    config: DebouncerConfig,
    window: DebounceWindow,
    cooldown: CooldownState,
    clock: C,
}

impl<C: Clock> AlertDebouncer<C> {
    pub fn new(config: DebouncerConfig, clock: C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            window: DebounceWindow::new(config.capacity),
            cooldown: CooldownState::new(),
            config,
            clock,
        })
    }

    pub fn observe(&mut self, detected: bool) -> AlertDecision {
        self.window.push(detected);

        let ratio = self.window.ratio();
        let window_len = self.window.len();
        let now = self.clock.now();

        let fire = window_len >= self.config.min_samples
            && ratio > self.config.alert_ratio
            && !self.cooldown.is_active(now, self.config.cooldown);

        let decision = if fire {
            self.cooldown.arm(now);
            self.window.clear();
            Decision::Alert
        } else {
            Decision::NoAlert
        };

        AlertDecision {
            decision,
            ratio,
            window_len,
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn phase(&self) -> CooldownPhase {
        self.cooldown.phase(self.clock.now(), self.config.cooldown)
    }

    pub fn last_alert(&self) -> Option<Duration> {
        self.cooldown.last_alert
    }

    pub fn config(&self) -> &DebouncerConfig {
        &self.config
    }
}

/// Debouncer handle for several frame producers. Each observation holds the
/// lock for the whole read-modify-write of window and cooldown.
pub struct SharedDebouncer<C> {
    inner: Arc<Mutex<AlertDebouncer<C>>>,
}

impl<C> Clone for SharedDebouncer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<C: Clock> SharedDebouncer<C> {
    pub fn new(debouncer: AlertDebouncer<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(debouncer)),
        }
    }

    pub fn observe(&self, detected: bool) -> AlertDecision {
        // The state is plain data and consistent between calls, so a panic in
        // another producer leaves nothing half-written.
        let mut debouncer = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        debouncer.observe(detected)
    }

    pub fn window_len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .window_len()
    }
}
