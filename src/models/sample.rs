use serde::{Deserialize, Serialize};

/// One tick of site throughput, bits per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSample {
    pub down_bps:        f64,
    pub up_bps:          f64,
    /// Portion of the traffic that passed through a shaper.
    pub shaped_down_bps: f64,
    pub shaped_up_bps:   f64,
}

impl ThroughputSample {
    pub fn total_bps(&self) -> f64 {
        self.down_bps + self.up_bps
    }

    /// Traffic that bypassed shaping, clamped at zero.
    pub fn unshaped_down_bps(&self) -> f64 {
        (self.down_bps - self.shaped_down_bps).max(0.0)
    }

    pub fn unshaped_up_bps(&self) -> f64 {
        (self.up_bps - self.shaped_up_bps).max(0.0)
    }
}

/// Min / mean / max over a window of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub latest: f64,
    pub mean:   f64,
    pub peak:   f64,
    pub min:    f64,
}

impl WindowStats {
    /// Stats over `values` in chronological order. All zero when empty.
    pub fn from_series(values: &[f64]) -> Self {
        let Some(&latest) = values.last() else {
            return Self::default();
        };
        let sum: f64 = values.iter().sum();
        Self {
            latest,
            mean: sum / values.len() as f64,
            peak: values.iter().copied().fold(f64::MIN, f64::max),
            min:  values.iter().copied().fold(f64::MAX, f64::min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unshaped_never_negative() {
        let s = ThroughputSample { down_bps: 10.0, up_bps: 5.0, shaped_down_bps: 12.0, shaped_up_bps: 1.0 };
        assert_eq!(s.unshaped_down_bps(), 0.0);
        assert_eq!(s.unshaped_up_bps(), 4.0);
        assert_eq!(s.total_bps(), 15.0);
    }

    #[test]
    fn window_stats() {
        let w = WindowStats::from_series(&[2.0, 8.0, 5.0]);
        assert_eq!(w.latest, 5.0);
        assert_eq!(w.mean, 5.0);
        assert_eq!(w.peak, 8.0);
        assert_eq!(w.min, 2.0);
        assert_eq!(WindowStats::from_series(&[]), WindowStats::default());
    }
}
