//! On-demand statistics over a `SampleBuffer`.
//!
//! Nothing is cached: buffers are bounded by their eviction policy, so a
//! full pass per query is cheap and always reflects the current contents.

use crate::buffer::SampleBuffer;
use crate::error::{CoreError, Result};
use crate::util::mean_of;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Time between oldest and newest retained sample.
    pub span_ms: u64,
}

pub struct RollingStatistics;

impl RollingStatistics {
    /// Arithmetic mean of the buffer's values.
    ///
    /// An empty buffer is `CoreError::EmptyWindow`, never a silent 0.
    pub fn mean(buffer: &SampleBuffer) -> Result<f64> {
        if buffer.is_empty() {
            return Err(CoreError::EmptyWindow);
        }
        Ok(mean_of(buffer.values()))
    }

    pub fn summary(buffer: &SampleBuffer) -> Result<WindowSummary> {
        let (Some(oldest), Some(newest)) = (buffer.oldest(), buffer.newest()) else {
            return Err(CoreError::EmptyWindow);
        };
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in buffer.values() {
            min = min.min(v);
            max = max.max(v);
        }
        Ok(WindowSummary {
            count: buffer.len(),
            mean: mean_of(buffer.values()),
            min,
            max,
            span_ms: newest.time_ms - oldest.time_ms,
        })
    }
}
