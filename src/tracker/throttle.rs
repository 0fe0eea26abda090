use crate::config::ThrottleConfig;

/// 最小間隔より速く到着したフレームを捨てるゲート
///
/// キューは持たない。遅れて来たフレームは後で再送せず捨てる。
pub struct FrameThrottle {
    min_interval_ms: u64,
    last_forwarded_ms: Option<u64>,
}

impl FrameThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_forwarded_ms: None,
        }
    }

    pub fn from_config(config: &ThrottleConfig) -> Self {
        Self::new(config.min_interval_ms)
    }

    /// 転送するなら true を返し、時刻を記録する
    ///
    /// 到着時刻は単調非減少であること。前回より古い時刻は経過0として扱う。
    pub fn admit(&mut self, arrival_ms: u64) -> bool {
        if let Some(last) = self.last_forwarded_ms {
            if arrival_ms.saturating_sub(last) < self.min_interval_ms {
                return false;
            }
        }
        self.last_forwarded_ms = Some(arrival_ms);
        true
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn last_forwarded_ms(&self) -> Option<u64> {
        self.last_forwarded_ms
    }
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::from_config(&ThrottleConfig::default())
    }
}
