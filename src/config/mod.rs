//! Process-wide configuration, loaded once at startup and published behind a
//! [`OnceLock`]. Call [`init`] exactly once before any other subsystem
//! starts; [`get`] panics if called first — deliberately, since a subsystem
//! running on an unvalidated config is a worse failure mode than a loud
//! panic at boot.

pub mod defaults;
mod engine_config;
mod validation;

use std::sync::OnceLock;

pub use engine_config::{
    ConfigProvenance, DetectorConfig, EngineConfig, FeedbackConfig, ForestConfig,
    MuleNetworkConfig, RuleRegistryConfig, ScoringConfig, SilenceConfig, StoreConfig,
};
pub use validation::validate;

use crate::error::ConfigError;

static CONFIG: OnceLock<EngineConfig> = OnceLock::new();

/// Load, validate, and publish the process-wide config. Must be called
/// exactly once, before [`get`]. Returns the validation error if the loaded
/// config violates a cross-field invariant; nothing is published
/// in that case.
pub fn init() -> Result<(), ConfigError> {
    let config = EngineConfig::load();
    validate(&config)?;
    // CONFIG.set() only fails if already initialized, which we treat as a
    // programming error rather than a runtime condition worth surfacing.
    let _ = CONFIG.set(config);
    Ok(())
}

/// Publish an already-constructed config directly, bypassing the file
/// search — used by tests and the demo binary.
pub fn init_with(config: EngineConfig) -> Result<(), ConfigError> {
    validate(&config)?;
    let _ = CONFIG.set(config);
    Ok(())
}

/// Returns the published config.
///
/// # Panics
/// Panics if called before [`init`] or [`init_with`]. By design: every
/// subsystem assumes a validated config is available, and running on
/// defaults nobody chose is worse than failing loudly at boot.
pub fn get() -> &'static EngineConfig {
    CONFIG
        .get()
        .expect("config::get() called before config::init()")
}

pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_with_publishes_config() {
        // OnceLock is process-global; only assert the read-back shape here,
        // since another test in this binary may have already initialized it.
        let _ = init_with(EngineConfig::default());
        assert!(is_initialized());
        assert_eq!(get().scoring.alert_threshold, defaults::ALERT_THRESHOLD);
    }

    #[test]
    fn init_with_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.scoring.alert_threshold = 90.0;
        config.scoring.block_threshold = 10.0;
        assert!(init_with(config).is_err());
    }
}
