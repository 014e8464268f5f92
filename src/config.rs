//! Engine configuration
//!
//! Resolution order: explicit path → `TOKENPARITY_CONFIG` → built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constraints::PlatformConstraintHandler;
use crate::error::{Error, Result};
use crate::providers::{
    AndroidDensity, AndroidUnitConverter, IosUnitConverter, ProviderMap, WebUnitConverter,
};
use crate::tolerance::{ToleranceCalculator, ToleranceConfig};
use crate::validation::{CrossPlatformValidator, ValidationOptions};

pub const CONFIG_ENV_VAR: &str = "TOKENPARITY_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub handle_constraints: bool,
    pub use_relative_tolerance: bool,
    pub strict_mode: bool,
    pub tolerance_multiplier: Option<f64>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            handle_constraints: true,
            use_relative_tolerance: false,
            strict_mode: false,
            tolerance_multiplier: None,
        }
    }
}

impl ValidationSettings {
    pub fn options(&self) -> ValidationOptions {
        ValidationOptions {
            use_relative_tolerance: self.use_relative_tolerance,
            strict_mode: self.strict_mode,
            tolerance_multiplier: self.tolerance_multiplier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub web_base_font_size: f64,
    pub ios_display_scale: f64,
    pub android_density: AndroidDensity,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            web_base_font_size: WebUnitConverter::DEFAULT_BASE_FONT_SIZE,
            ios_display_scale: 1.0,
            android_density: AndroidDensity::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tolerance: ToleranceConfig,
    pub validation: ValidationSettings,
    pub providers: ProviderSettings,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "loaded engine configuration");
        Ok(config)
    }

    /// Loads `explicit` if given, else the file named by `TOKENPARITY_CONFIG`,
    /// else returns defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(value) if !value.is_empty() => Self::load_from_file(&PathBuf::from(value)),
            _ => {
                debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Rejects values that would make conversion or tolerance comparisons meaningless.
    pub fn check(&self) -> Result<()> {
        let t = &self.tolerance;
        let budgets = [
            ("base_tolerance", t.base_tolerance),
            ("conversion_tolerance", t.conversion_tolerance),
            ("constraint_tolerance", t.constraint_tolerance),
            ("relative_tolerance_factor", t.relative_tolerance_factor),
            ("strategic_flexibility_factor", t.strategic_flexibility_factor),
        ];
        for (name, value) in budgets {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "tolerance.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        for (category, value) in &t.category_tolerances {
            if !value.is_finite() || *value < 0.0 {
                return Err(Error::Config(format!(
                    "tolerance.category_tolerances.{} must be a non-negative number, got {}",
                    category, value
                )));
            }
        }

        if let Some(multiplier) = self.validation.tolerance_multiplier {
            if !multiplier.is_finite() || multiplier <= 0.0 {
                return Err(Error::Config(format!(
                    "validation.tolerance_multiplier must be positive, got {}",
                    multiplier
                )));
            }
        }

        let p = &self.providers;
        if !p.web_base_font_size.is_finite() || p.web_base_font_size <= 0.0 {
            return Err(Error::Config(format!(
                "providers.web_base_font_size must be positive, got {}",
                p.web_base_font_size
            )));
        }
        if !p.ios_display_scale.is_finite() || p.ios_display_scale <= 0.0 {
            return Err(Error::Config(format!(
                "providers.ios_display_scale must be positive, got {}",
                p.ios_display_scale
            )));
        }

        Ok(())
    }

    pub fn build_providers(&self) -> ProviderMap {
        let mut providers: ProviderMap = ProviderMap::new();
        providers.insert(
            "web".to_string(),
            Box::new(WebUnitConverter::with_base_font_size(
                self.providers.web_base_font_size,
            )),
        );
        providers.insert(
            "ios".to_string(),
            Box::new(IosUnitConverter::with_display_scale(
                self.providers.ios_display_scale,
            )),
        );
        providers.insert(
            "android".to_string(),
            Box::new(AndroidUnitConverter::with_density(
                self.providers.android_density,
            )),
        );
        providers
    }

    pub fn build_validator(&self) -> CrossPlatformValidator {
        CrossPlatformValidator::new(
            ToleranceCalculator::with_config(self.tolerance.clone()),
            PlatformConstraintHandler::default(),
        )
    }
}
