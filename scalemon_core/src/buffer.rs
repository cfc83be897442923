//! Time-ordered sample history with a configurable eviction strategy.
//!
//! Samples are appended in non-decreasing time order and evicted lazily on
//! insert, always from the front. Two strategies cover both uses on the
//! dashboard: a fixed number of chart points, or a trailing time window.

use crate::error::{CoreError, Result};
use std::collections::VecDeque;

/// One telemetry value stamped with a caller-supplied monotonic time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time_ms: u64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Drop samples older than `window_ms` relative to the newest sample.
    MaxAge { window_ms: u64 },
    /// Keep only the `capacity` newest samples.
    MaxCount { capacity: usize },
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::MaxCount { capacity: 20 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    policy: EvictionPolicy,
}

impl SampleBuffer {
    pub fn new(policy: EvictionPolicy) -> Self {
        let samples = match policy {
            EvictionPolicy::MaxCount { capacity } => VecDeque::with_capacity(capacity),
            EvictionPolicy::MaxAge { .. } => VecDeque::new(),
        };
        Self { samples, policy }
    }

    pub fn with_max_age(window_ms: u64) -> Self {
        Self::new(EvictionPolicy::MaxAge { window_ms })
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(EvictionPolicy::MaxCount { capacity })
    }

    /// Append a sample, then evict per policy.
    ///
    /// A timestamp earlier than the newest retained sample is rejected and
    /// leaves the buffer untouched; equal timestamps are accepted.
    pub fn insert(&mut self, time_ms: u64, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "sample value must be finite, got {value}"
            )));
        }
        if let Some(newest) = self.samples.back()
            && time_ms < newest.time_ms
        {
            return Err(CoreError::OrderViolation {
                newest_ms: newest.time_ms,
                got_ms: time_ms,
            });
        }
        self.samples.push_back(Sample { time_ms, value });
        self.evict(time_ms);
        Ok(())
    }

    fn evict(&mut self, now_ms: u64) {
        match self.policy {
            EvictionPolicy::MaxAge { window_ms } => {
                while let Some(front) = self.samples.front() {
                    if now_ms - front.time_ms > window_ms {
                        self.samples.pop_front();
                    } else {
                        break;
                    }
                }
            }
            EvictionPolicy::MaxCount { capacity } => {
                while self.samples.len() > capacity {
                    self.samples.pop_front();
                }
            }
        }
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + Clone + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
