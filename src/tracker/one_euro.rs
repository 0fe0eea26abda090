use crate::config::FilterConfig;

/// Low-pass filter component
struct LowPassFilter {
    prev: Option<f32>,
}

impl LowPassFilter {
    fn new() -> Self {
        Self { prev: None }
    }

    fn filter(&mut self, value: f32, alpha: f32) -> f32 {
        match self.prev {
            Some(prev) => {
                let result = alpha * value + (1.0 - alpha) * prev;
                self.prev = Some(result);
                result
            }
            None => {
                self.prev = Some(value);
                value
            }
        }
    }
}

/// alpha = 1 / (1 + tau/Te), tau = 1/(2*pi*fc)
fn smoothing_factor(te: f32, cutoff: f32) -> f32 {
    let r = 2.0 * std::f32::consts::PI * cutoff * te;
    r / (r + 1.0)
}

/// Fallback sample period when two samples share a timestamp (30 Hz)
const DEFAULT_DT: f32 = 1.0 / 30.0;

/// One Euro Filter for the averaged joint angle.
///
/// Timing comes from frame arrival timestamps rather than the wall clock, so
/// replaying a recorded session gives the same output as the live run.
pub struct AngleFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
    x_filter: LowPassFilter,
    dx_filter: LowPassFilter,
    prev: Option<(f32, u64)>,
}

impl AngleFilter {
    pub fn new(min_cutoff: f32, beta: f32, d_cutoff: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            x_filter: LowPassFilter::new(),
            dx_filter: LowPassFilter::new(),
            prev: None,
        }
    }

    /// None when the filter is disabled in config
    pub fn from_config(config: &FilterConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.min_cutoff, config.beta, config.d_cutoff))
    }

    pub fn filter(&mut self, value: f32, t_ms: u64) -> f32 {
        let (dx, dt) = match self.prev {
            Some((prev, prev_t)) => {
                let dt = t_ms.saturating_sub(prev_t) as f32 / 1000.0;
                let dt = if dt > 0.0 { dt } else { DEFAULT_DT };
                ((value - prev) / dt, dt)
            }
            None => (0.0, DEFAULT_DT),
        };
        self.prev = Some((value, t_ms));

        let edx = self
            .dx_filter
            .filter(dx, smoothing_factor(dt, self.d_cutoff));
        let cutoff = self.min_cutoff + self.beta * edx.abs();
        self.x_filter.filter(value, smoothing_factor(dt, cutoff))
    }
}
