//! INI parsing for [`CacheConfig`].
//!
//! The single place where INI section and key names map to config fields.

use ini::{Ini, Properties};

use super::file::ConfigError;
use super::settings::CacheConfig;
use super::size::parse_size;
use crate::memory::Tier;

/// Overlay values found in `ini` onto `CacheConfig::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<CacheConfig, ConfigError> {
    let mut config = CacheConfig::default();

    for tier in Tier::ALL {
        let section_name = tier.to_string();
        if let Some(section) = ini.section(Some(section_name.as_str())) {
            parse_tier_section(&section_name, section, &mut config, tier)?;
        }
    }

    // [spill] section
    if let Some(section) = ini.section(Some("spill")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.spill_dir = v.into();
            }
        }
    }

    Ok(config)
}

fn parse_tier_section(
    section_name: &str,
    section: &Properties,
    config: &mut CacheConfig,
    tier: Tier,
) -> Result<(), ConfigError> {
    let settings = config.tier_mut(tier);

    if let Some(v) = section.get("limit") {
        let v = v.trim();
        settings.limit = if v.eq_ignore_ascii_case("none") {
            None
        } else {
            let size = parse_size(v).map_err(|_| {
                invalid(
                    section_name,
                    "limit",
                    v,
                    "expected 'none' or a size like '4GB', '512MB', or '1024KB'",
                )
            })?;
            Some(size)
        };
    }

    if let Some(v) = section.get("threshold") {
        let v = v.trim();
        let threshold: f64 = v
            .parse()
            .map_err(|_| invalid(section_name, "threshold", v, "must be a number"))?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(
                section_name,
                "threshold",
                v,
                "must be between 0.0 and 1.0",
            ));
        }
        settings.threshold = threshold;
    }

    Ok(())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
