use super::config::ChartConfig;
use crate::core::models::series::ChartSample;
use crate::core::physics::bloch::transverse_magnitude;
use crate::core::physics::contrast::clamp01;
use nalgebra::Vector3;
use std::collections::VecDeque;

// Slack for accumulated float error in the cadence comparison.
const DUE_EPSILON: f64 = 1e-9;

/// Rolling chart of the total vector, bounded both by sample count and by a sliding time
/// window whose left edge is `base` seconds after `start`.
#[derive(Debug, Clone)]
pub struct ChartSampler {
    config: ChartConfig,
    start: f64,
    base: f64,
    next_due: f64,
    series: VecDeque<ChartSample>,
}

impl ChartSampler {
    pub fn new(config: ChartConfig, start: f64) -> Self {
        Self {
            config,
            start,
            base: 0.0,
            next_due: start + config.interval,
            series: VecDeque::with_capacity(config.capacity),
        }
    }

    pub fn is_due(&self, now: f64) -> bool {
        now + DUE_EPSILON >= self.next_due
    }

    /// Takes a sample when the cadence is due. Missed intervals are skipped, not replayed.
    pub fn poll(&mut self, total: &Vector3<f64>, now: f64) -> Option<ChartSample> {
        if !self.is_due(now) {
            return None;
        }
        self.next_due += self.config.interval;
        if self.next_due <= now + DUE_EPSILON {
            self.next_due = now + self.config.interval;
        }
        Some(self.sample(total, now))
    }

    /// Records a sample of `total` at `now` unconditionally.
    pub fn sample(&mut self, total: &Vector3<f64>, now: f64) -> ChartSample {
        let raw_time = now - self.start;
        let next_base = (raw_time - self.config.window).max(0.0);
        if next_base > self.base {
            let shift = next_base - self.base;
            for s in self.series.iter_mut() {
                s.time = (s.time - shift).max(0.0);
            }
            self.base = next_base;
        }

        let sample = ChartSample {
            time: (raw_time - self.base).clamp(0.0, self.config.window),
            mz: clamp01(total.z),
            mxy: clamp01(transverse_magnitude(total)),
        };
        self.series.push_back(sample);
        while self.series.len() > self.config.capacity {
            self.series.pop_front();
        }
        sample
    }

    pub fn series(&self) -> impl ExactSizeIterator<Item = &ChartSample> + '_ {
        self.series.iter()
    }

    pub fn to_vec(&self) -> Vec<ChartSample> {
        self.series.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<&ChartSample> {
        self.series.back()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Seconds between `start` and the left edge of the window.
    pub fn base(&self) -> f64 {
        self.base
    }
}
