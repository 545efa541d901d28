use thiserror::Error;

/// Sampling failed because the query violates the driver contract.
/// Everything else in the pipeline degrades to a neutral value instead.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SampleError {
    #[error("no position updates recorded yet")]
    EmptyTimeline,
    #[error("query time {query}s precedes first update at {first}s")]
    OutOfRange { query: f64, first: f64 },
}

/// Full record of the update timeline, kept separately from the bounded
/// history so position lookup works at any queried time.
///
/// Timestamps must be pushed in non-decreasing order.
#[derive(Debug, Clone, Default)]
pub struct PositionTimeline {
    times: Vec<f64>,
    values: Vec<f32>,
}

impl PositionTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, timestamp: f64, value: f32) {
        self.times.push(timestamp);
        self.values.push(value);
    }

    /// Last-observed-value hold: the value of the latest update at or
    /// before `t`. A query from before the first update is a driver bug
    /// and is surfaced rather than guessed at.
    pub fn value_at(&self, t: f64) -> Result<f32, SampleError> {
        let first = *self.times.first().ok_or(SampleError::EmptyTimeline)?;
        if t < first {
            return Err(SampleError::OutOfRange { query: t, first });
        }
        let idx = self.times.partition_point(|&ts| ts <= t) - 1;
        Ok(self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline() -> PositionTimeline {
        let mut tl = PositionTimeline::new();
        tl.record(1.0, 0.1);
        tl.record(2.0, 0.5);
        tl.record(4.0, 0.9);
        tl
    }

    #[test]
    fn holds_last_observed_value() {
        let tl = timeline();
        assert_eq!(tl.value_at(1.5), Ok(0.1));
        assert_eq!(tl.value_at(3.9), Ok(0.5));
        assert_eq!(tl.value_at(100.0), Ok(0.9));
    }

    #[test]
    fn exact_timestamp_returns_that_update() {
        let tl = timeline();
        assert_eq!(tl.value_at(2.0), Ok(0.5));
    }

    #[test]
    fn query_before_first_update_is_out_of_range() {
        let tl = timeline();
        assert_eq!(
            tl.value_at(0.5),
            Err(SampleError::OutOfRange {
                query: 0.5,
                first: 1.0
            })
        );
    }

    #[test]
    fn empty_timeline_is_an_error() {
        let tl = PositionTimeline::new();
        assert_eq!(tl.value_at(0.0), Err(SampleError::EmptyTimeline));
    }
}
