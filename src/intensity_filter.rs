use serde::{Deserialize, Serialize};

use crate::history::{HistoryBuffer, Sample};
use crate::resampler::{PositionTimeline, SampleError};
use crate::velocity::velocity_since;

/// Values this close to zero count as "already off" for the stale cutoff.
const OFF_EPSILON: f32 = 0.001;

/// Tuning for one intensity stream.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct IntensityConfig {
    /// How far back (in seconds) to average velocity.
    pub smoothing_time: f64,
    /// Expected input rate in Hz; only sizes the history buffer.
    pub nominal_update_rate: f64,
    /// Weight of the position term; the velocity term gets the remainder.
    pub position_weight: f32,
    /// Extra gain on the velocity term. 1.0 is reasonable, if fast.
    pub velocity_multiplier: f32,
    /// Extra gain on the position term.
    pub contact_scale: f32,
    /// Force output to zero when the newest update is nonzero but older
    /// than this many seconds; covers a lost closing-zero update that
    /// would otherwise leave the actuator buzzing.
    pub stale_cutoff: Option<f64>,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            smoothing_time: 0.2,
            nominal_update_rate: 10.0,
            position_weight: 0.3,
            velocity_multiplier: 1.0,
            contact_scale: 1.0,
            stale_cutoff: None,
        }
    }
}

impl IntensityConfig {
    /// History cap: twice the window's worth of updates at the nominal rate.
    fn history_len(&self) -> usize {
        (self.smoothing_time * self.nominal_update_rate * 2.0).floor() as usize
    }
}

/// One output tick. `combined` is the only value sent downstream; the
/// separate terms feed trace logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputSample {
    pub timestamp: f64,
    pub position_term: f32,
    pub velocity_term: f32,
    pub combined: f32,
}

/// Blends last-known position with windowed average absolute velocity into
/// a single bounded intensity. One instance per signal stream; readers
/// never mutate it, so a tick is a pure function of (time, state).
#[derive(Debug, Clone)]
pub struct IntensityFilter {
    config: IntensityConfig,
    history: HistoryBuffer,
    timeline: PositionTimeline,
}

impl IntensityFilter {
    pub fn new(mut config: IntensityConfig) -> Self {
        config.position_weight = config.position_weight.clamp(0.0, 1.0);
        let history = HistoryBuffer::new(config.history_len());
        Self {
            config,
            history,
            timeline: PositionTimeline::new(),
        }
    }

    pub fn config(&self) -> &IntensityConfig {
        &self.config
    }

    /// Feed one position update. Timestamps must be non-decreasing in
    /// arrival order.
    pub fn ingest(&mut self, timestamp: f64, value: f32) {
        self.history.push(Sample::new(timestamp, value));
        self.timeline.record(timestamp, value);
    }

    /// Produce the combined intensity for an output tick at `timestamp`.
    pub fn sample(&self, timestamp: f64) -> Result<f32, SampleError> {
        self.sample_parts(timestamp).map(|s| s.combined)
    }

    /// As [`sample`](Self::sample), but keeps the position and velocity
    /// terms visible.
    pub fn sample_parts(&self, timestamp: f64) -> Result<OutputSample, SampleError> {
        let position_term = self.timeline.value_at(timestamp)?.clamp(0.0, 1.0);

        let limit = timestamp - self.config.smoothing_time;
        let velocity_term = velocity_since(&self.history, limit).clamp(0.0, 1.0);

        let combined = if self.is_stale(timestamp) {
            0.0
        } else {
            let position_weight = self.config.position_weight;
            let velocity_weight = 1.0 - position_weight;
            (velocity_weight * velocity_term * self.config.velocity_multiplier
                + position_weight * position_term * self.config.contact_scale)
                .clamp(0.0, 1.0)
        };

        Ok(OutputSample {
            timestamp,
            position_term,
            velocity_term,
            combined,
        })
    }

    /// The newest update is nonzero but has outlived the cutoff: the
    /// closing zero never arrived.
    fn is_stale(&self, timestamp: f64) -> bool {
        let Some(cutoff) = self.config.stale_cutoff else {
            return false;
        };
        match self.history.newest() {
            Some(newest) => newest.value > OFF_EPSILON && timestamp - newest.timestamp > cutoff,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_with(config: IntensityConfig, samples: &[(f64, f32)]) -> IntensityFilter {
        let mut filter = IntensityFilter::new(config);
        for &(t, v) in samples {
            filter.ingest(t, v);
        }
        filter
    }

    #[test]
    fn position_only_blend() {
        let config = IntensityConfig {
            position_weight: 0.3,
            ..Default::default()
        };
        // static signal, velocity term is zero
        let filter = filter_with(config, &[(0.0, 1.0), (1.0, 1.0)]);
        let out = filter.sample_parts(1.0).unwrap();
        assert_eq!(out.velocity_term, 0.0);
        assert_eq!(out.position_term, 1.0);
        assert!((out.combined - 0.3).abs() < 1e-6);
    }

    #[test]
    fn combined_stays_in_unit_range() {
        let config = IntensityConfig {
            position_weight: 0.5,
            smoothing_time: 10.0,
            ..Default::default()
        };
        // steep slope pushes the raw velocity far above 1.0
        let filter = filter_with(config, &[(0.0, 0.0), (0.01, 1.0)]);
        let out = filter.sample_parts(0.01).unwrap();
        assert_eq!(out.velocity_term, 1.0);
        assert!(out.combined >= 0.0 && out.combined <= 1.0);
    }

    #[test]
    fn sampling_is_idempotent() {
        let filter = filter_with(IntensityConfig::default(), &[(0.0, 0.2), (0.1, 0.7)]);
        assert_eq!(filter.sample(0.15).unwrap(), filter.sample(0.15).unwrap());
    }

    #[test]
    fn sample_before_first_ingest_fails() {
        let filter = filter_with(IntensityConfig::default(), &[(5.0, 0.5)]);
        assert!(matches!(
            filter.sample(4.0),
            Err(SampleError::OutOfRange { .. })
        ));
        let empty = IntensityFilter::new(IntensityConfig::default());
        assert_eq!(empty.sample(0.0), Err(SampleError::EmptyTimeline));
    }

    #[test]
    fn velocity_multiplier_scales_before_clamp() {
        let base = IntensityConfig {
            position_weight: 0.0,
            smoothing_time: 1.0,
            ..Default::default()
        };
        let boosted = IntensityConfig {
            velocity_multiplier: 2.0,
            ..base
        };
        let samples = [(0.0, 0.0), (1.0, 0.2)];
        let plain = filter_with(base, &samples).sample(1.0).unwrap();
        let double = filter_with(boosted, &samples).sample(1.0).unwrap();
        assert!((plain - 0.2).abs() < 1e-6);
        assert!((double - 0.4).abs() < 1e-6);
    }

    #[test]
    fn stale_nonzero_input_drops_to_zero() {
        let config = IntensityConfig {
            stale_cutoff: Some(0.2),
            ..Default::default()
        };
        let filter = filter_with(config, &[(0.0, 0.0), (0.1, 0.8)]);
        // fresh: still blending
        assert!(filter.sample(0.15).unwrap() > 0.0);
        // newest update is 0.8 and half a second old: forced off
        assert_eq!(filter.sample(0.6).unwrap(), 0.0);
    }

    #[test]
    fn stale_cutoff_spares_a_closed_stream() {
        let config = IntensityConfig {
            stale_cutoff: Some(0.2),
            ..Default::default()
        };
        let filter = filter_with(config, &[(0.0, 0.8), (0.1, 0.0)]);
        // newest value is zero, quiet stream is simply off, not stale
        assert_eq!(filter.sample(5.0).unwrap(), 0.0);
    }

    #[test]
    fn history_cap_follows_config() {
        let config = IntensityConfig {
            smoothing_time: 0.2,
            nominal_update_rate: 10.0,
            ..Default::default()
        };
        // floor(0.2 * 10 * 2) = 4
        let mut filter = IntensityFilter::new(config);
        for i in 0..50 {
            filter.ingest(i as f64 * 0.1, 0.5);
        }
        assert_eq!(filter.history.len(), 4);
    }

    #[test]
    fn position_weight_is_clamped_at_construction() {
        let config = IntensityConfig {
            position_weight: 7.5,
            ..Default::default()
        };
        let filter = IntensityFilter::new(config);
        assert_eq!(filter.config().position_weight, 1.0);
    }
}
