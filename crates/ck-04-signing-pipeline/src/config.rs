//! # Pipeline Configuration

use serde::{Deserialize, Serialize};

/// Headroom applied to simulated gas.
///
/// The dry run cannot see signature verification, so the limit is
/// `round((simulated + base) * scale)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    pub base: u64,
    pub scale: f64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            base: 750_000,
            scale: 1.3,
        }
    }
}

impl GasConfig {
    /// Gas limit for a simulated `gas_used`.
    pub fn limit_for(&self, simulated: u64) -> u64 {
        (simulated.saturating_add(self.base) as f64 * self.scale).round() as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub gas: GasConfig,
}

impl PipelineConfig {
    pub fn for_testing() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_headroom() {
        let gas = GasConfig::default();
        assert_eq!(gas.limit_for(0), 975_000);
        assert_eq!(gas.limit_for(100_000), 1_105_000);
    }

    #[test]
    fn test_rounds_to_nearest() {
        let gas = GasConfig { base: 0, scale: 1.5 };
        assert_eq!(gas.limit_for(3), 5);
        assert_eq!(gas.limit_for(1), 2);
    }
}
