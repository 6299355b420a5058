//! Startup validation of cross-field config invariants. Run once
//! from [`super::init`] before the global is published.

use crate::error::ConfigError;

use super::engine_config::EngineConfig;

pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    if !(config.scoring.alert_threshold < config.scoring.block_threshold) {
        return Err(ConfigError::ThresholdOrdering {
            alert: config.scoring.alert_threshold,
            block: config.scoring.block_threshold,
        });
    }

    if !(config.feedback.weight_ceiling > config.feedback.weight_floor) {
        return Err(ConfigError::WeightBounds {
            floor: config.feedback.weight_floor,
            ceiling: config.feedback.weight_ceiling,
        });
    }

    if !(config.scoring.ewma_alpha > 0.0 && config.scoring.ewma_alpha <= 1.0) {
        return Err(ConfigError::InvalidAlpha(config.scoring.ewma_alpha));
    }

    Ok(())
}
