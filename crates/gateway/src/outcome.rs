//! Where charge delays and outcomes come from.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use domain::PaymentStatus;
use rand::Rng;

use crate::GatewayConfig;

/// Picks how long a charge stays pending and how it ends.
pub trait OutcomeSource: Send + Sync {
    fn delay(&self, config: &GatewayConfig) -> Duration;

    /// Returns `Success` or `Failed`.
    fn outcome(&self, config: &GatewayConfig) -> PaymentStatus;
}

/// Uniform delay within the configured bounds, success with the configured
/// probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcome;

impl OutcomeSource for RandomOutcome {
    fn delay(&self, config: &GatewayConfig) -> Duration {
        if config.max_delay <= config.min_delay {
            return config.min_delay;
        }
        rand::thread_rng().gen_range(config.min_delay..=config.max_delay)
    }

    fn outcome(&self, config: &GatewayConfig) -> PaymentStatus {
        if rand::thread_rng().r#gen::<f64>() < config.success_rate {
            PaymentStatus::Success
        } else {
            PaymentStatus::Failed
        }
    }
}

/// Deterministic source for tests: always waits `min_delay` and returns the
/// configured status, which can be changed between charges.
#[derive(Debug)]
pub struct FixedOutcome {
    status: RwLock<PaymentStatus>,
}

impl FixedOutcome {
    pub fn new(status: PaymentStatus) -> Self {
        Self {
            status: RwLock::new(status),
        }
    }

    pub fn success() -> Self {
        Self::new(PaymentStatus::Success)
    }

    pub fn failure() -> Self {
        Self::new(PaymentStatus::Failed)
    }

    pub fn set_status(&self, status: PaymentStatus) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = status;
    }
}

impl OutcomeSource for FixedOutcome {
    fn delay(&self, config: &GatewayConfig) -> Duration {
        config.min_delay
    }

    fn outcome(&self, _config: &GatewayConfig) -> PaymentStatus {
        *self.status.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_delay_within_bounds() {
        let config = GatewayConfig::new(Duration::from_millis(10), Duration::from_millis(20), 0.5);
        for _ in 0..100 {
            let delay = RandomOutcome.delay(&config);
            assert!(delay >= config.min_delay && delay <= config.max_delay);
        }
    }

    #[test]
    fn test_random_outcome_extremes() {
        let always = GatewayConfig::new(Duration::ZERO, Duration::ZERO, 1.0);
        let never = GatewayConfig::new(Duration::ZERO, Duration::ZERO, 0.0);
        for _ in 0..50 {
            assert_eq!(RandomOutcome.outcome(&always), PaymentStatus::Success);
            assert_eq!(RandomOutcome.outcome(&never), PaymentStatus::Failed);
        }
    }

    #[test]
    fn test_fixed_outcome_can_change() {
        let config = GatewayConfig::default();
        let source = FixedOutcome::success();
        assert_eq!(source.outcome(&config), PaymentStatus::Success);
        assert_eq!(source.delay(&config), config.min_delay);

        source.set_status(PaymentStatus::Failed);
        assert_eq!(source.outcome(&config), PaymentStatus::Failed);
    }
}
