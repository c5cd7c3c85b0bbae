//! Signal conditioning shared by the classifiers
//!
//! Small building blocks: a trailing mean, a first-sample-exact EMA, an
//! adaptive baseline for online calibration and a repeat-interval gate.

use std::collections::VecDeque;

/// Fixed-length trailing window reporting the mean of its samples
#[derive(Debug, Clone)]
pub struct TrailingWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl TrailingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a sample and return the updated mean
    pub fn push(&mut self, value: f64) -> f64 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the window length, dropping the oldest samples if it shrinks
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Exponential moving average; the first sample initializes it exactly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    pub alpha: f64,
    value: Option<f64>,
}

impl Ema {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(prev) => prev + self.alpha * (sample - prev),
        };
        self.value = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

/// Slowly adapting estimate of a signal's rest value.
///
/// Samples further than `band` from the current estimate are treated as a
/// gesture, not drift, and leave the baseline untouched. With `relearn_after`
/// set, a run of that many consecutive out-of-band samples is taken as a new
/// rest level and the baseline starts following it at `rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveBaseline {
    value: Option<f64>,
    pub rate: f64,
    pub band: f64,
    /// 0 never re-learns
    pub relearn_after: u32,
    outside: u32,
}

impl AdaptiveBaseline {
    pub fn new(rate: f64, band: f64) -> Self {
        Self {
            value: None,
            rate,
            band,
            relearn_after: 0,
            outside: 0,
        }
    }

    pub fn with_relearn_after(mut self, samples: u32) -> Self {
        self.relearn_after = samples;
        self
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Feed a sample; returns the baseline after adaptation
    pub fn observe(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(base) if (sample - base).abs() <= self.band => {
                self.outside = 0;
                base + self.rate * (sample - base)
            }
            Some(base) => {
                self.outside = self.outside.saturating_add(1);
                if self.relearn_after > 0 && self.outside >= self.relearn_after {
                    base + self.rate * (sample - base)
                } else {
                    base
                }
            }
        };
        self.value = Some(next);
        next
    }

    /// Signed distance of `sample` from the baseline, if one has been learned
    pub fn deviation(&self, sample: f64) -> Option<f64> {
        self.value.map(|base| sample - base)
    }

    pub fn reset(&mut self) {
        self.value = None;
        self.outside = 0;
    }
}

/// Lets an action repeat at a fixed interval while a condition holds.
///
/// The first poll after the condition becomes true fires immediately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatTicker {
    pub interval: f64,
    next_at: Option<f64>,
}

impl RepeatTicker {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            next_at: None,
        }
    }

    pub fn poll(&mut self, now: f64, active: bool) -> bool {
        if !active {
            self.next_at = None;
            return false;
        }
        match self.next_at {
            Some(at) if now < at => false,
            _ => {
                self.next_at = Some(now + self.interval);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.next_at = None;
    }
}
