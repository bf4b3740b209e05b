//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::TesselConfig;
use std::path::Path;

/// Loads and validates `<dir>/tessel.toml`.
pub fn load_config(dir: &Path) -> Result<TesselConfig, ConfigError> {
    let path = dir.join("tessel.toml");
    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates configuration text.
pub fn load_config_from_str(content: &str) -> Result<TesselConfig, ConfigError> {
    let config: TesselConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn ensure(ok: bool, key: &'static str, expected: &'static str, value: impl ToString) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            key,
            expected,
            value: value.to_string(),
        })
    }
}

/// Checks that schedule and negotiation parameters are in range.
///
/// Configurations built in code rather than parsed should go through this
/// before being handed to the engines.
pub fn validate_config(config: &TesselConfig) -> Result<(), ConfigError> {
    let place = &config.place;
    let route = &config.route;
    let alpha = place.cool.alpha;
    ensure(alpha > 0.0 && alpha < 1.0, "place.cool.alpha", "in (0, 1)", alpha)?;
    ensure(
        place.warm.multiplier > 1.0,
        "place.warm.multiplier",
        "greater than 1",
        place.warm.multiplier,
    )?;
    ensure(place.limit.minimum >= 0.0, "place.limit.minimum", "non-negative", place.limit.minimum)?;
    ensure(
        place.initial_temperature > 0.0,
        "place.initial_temperature",
        "positive",
        place.initial_temperature,
    )?;
    ensure(route.max_iterations > 0, "route.max_iterations", "at least 1", route.max_iterations)?;
    ensure(route.present_factor >= 0.0, "route.present_factor", "non-negative", route.present_factor)?;
    Ok(())
}
