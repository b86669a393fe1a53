use std::collections::VecDeque;
use std::time::Duration;

/// Most recent detection samples, oldest first, bounded to `capacity`.
#[derive(Debug, Clone)]
pub struct DebounceWindow {
    samples: VecDeque<bool>,
    capacity: usize,
    positives: usize,
}

impl DebounceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            positives: 0,
        }
    }

    pub fn push(&mut self, detected: bool) {
        self.samples.push_back(detected);
        if detected {
            self.positives += 1;
        }

        while self.samples.len() > self.capacity {
            if let Some(true) = self.samples.pop_front() {
                self.positives -= 1;
            }
        }
    }

    /// Fraction of positive samples, 0 for an empty window.
    pub fn ratio(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }

        self.positives as f32 / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn positives(&self) -> usize {
        self.positives
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.positives = 0;
    }
}

/// Lazily evaluated view of the cooldown gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownPhase {
    Idle,
    Suppressed,
}

#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    pub last_alert: Option<Duration>,
}

impl CooldownState {
    pub fn new() -> Self {
        Self { last_alert: None }
    }

    pub fn is_active(&self, now: Duration, cooldown: Duration) -> bool {
        match self.last_alert {
            Some(last) => now.saturating_sub(last) < cooldown,
            None => false,
        }
    }

    pub fn phase(&self, now: Duration, cooldown: Duration) -> CooldownPhase {
        if self.is_active(now, cooldown) {
            CooldownPhase::Suppressed
        } else {
            CooldownPhase::Idle
        }
    }

    pub fn arm(&mut self, now: Duration) {
        self.last_alert = Some(now);
    }
}
