//! Simulator knobs.

use std::time::Duration;

/// Timing and outcome settings for [`MockPaymentGateway`](crate::MockPaymentGateway).
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Shortest delay before a charge resolves.
    pub min_delay: Duration,
    /// Longest delay before a charge resolves.
    pub max_delay: Duration,
    /// Probability that a charge resolves to `SUCCESS`.
    pub success_rate: f64,
}

impl GatewayConfig {
    pub fn new(min_delay: Duration, max_delay: Duration, success_rate: f64) -> Self {
        Self {
            min_delay,
            max_delay,
            success_rate,
        }
        .normalized()
    }

    /// Orders the delay bounds and clamps the success rate into `0.0..=1.0`.
    pub fn normalized(mut self) -> Self {
        if self.max_delay < self.min_delay {
            std::mem::swap(&mut self.min_delay, &mut self.max_delay);
        }
        self.success_rate = if self.success_rate.is_nan() {
            0.0
        } else {
            self.success_rate.clamp(0.0, 1.0)
        };
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(8_000),
            max_delay: Duration::from_millis(15_000),
            success_rate: 0.8,
        }
    }
}
