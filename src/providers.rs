//! Unit Conversion Providers
//!
//! One provider per platform family. Providers are pure: the same token and
//! category always produce the same platform value. A provider may refuse
//! malformed input; isolating that refusal per platform is the validator's job.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::tokens::{PlatformValue, PrimitiveToken, TokenCategory, TokenValue};

/// Largest magnitude a converted value may take before it is considered unreasonable.
pub const MAX_REASONABLE_VALUE: f64 = 10_000.0;

const CONVERSION_CHECK_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversionError {
    #[error("{platform}: non-finite value {value} for {category}")]
    NonFiniteValue {
        platform: String,
        category: TokenCategory,
        value: f64,
    },

    #[error("{platform}: text value \"{value}\" cannot be converted for numeric category {category}")]
    TextForNumericCategory {
        platform: String,
        category: TokenCategory,
        value: String,
    },

    #[error("{platform}: numeric value {value} given for categorical category {category}")]
    NumberForCategoricalCategory {
        platform: String,
        category: TokenCategory,
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionFactor {
    pub factor: f64,
    pub unit: String,
}

impl ConversionFactor {
    fn new(factor: f64, unit: &str) -> Self {
        Self {
            factor,
            unit: unit.to_string(),
        }
    }
}

/// Platform unit conversion capability
pub trait UnitProvider: Send + Sync {
    fn platform(&self) -> &str;

    fn convert_value(
        &self,
        value: &TokenValue,
        category: TokenCategory,
    ) -> Result<PlatformValue, ConversionError>;

    fn conversion_factor(&self, category: TokenCategory) -> ConversionFactor;

    fn convert_token(&self, token: &PrimitiveToken) -> Result<PlatformValue, ConversionError> {
        self.convert_value(&token.base_value, token.category)
    }

    /// Checks a converted value against the original: text must match exactly,
    /// numbers must be non-negative and agree with the conversion factor.
    fn validate_conversion(
        &self,
        original: &TokenValue,
        converted: &PlatformValue,
        category: TokenCategory,
    ) -> bool {
        match (original, &converted.value) {
            (TokenValue::Text(a), TokenValue::Text(b)) => a == b,
            (TokenValue::Number(orig), TokenValue::Number(conv)) => {
                if *conv < 0.0 || !conv.is_finite() {
                    return false;
                }
                let expected = orig * self.conversion_factor(category).factor;
                (conv - expected).abs() <= CONVERSION_CHECK_TOLERANCE
            }
            _ => false,
        }
    }
}

/// Platform id -> provider, as handed to the validator.
pub type ProviderMap = BTreeMap<String, Box<dyn UnitProvider>>;

/// The three reference providers keyed by their platform ids.
pub fn reference_providers() -> ProviderMap {
    let mut providers: ProviderMap = BTreeMap::new();
    providers.insert("web".to_string(), Box::new(WebUnitConverter::new()));
    providers.insert("ios".to_string(), Box::new(IosUnitConverter::new()));
    providers.insert("android".to_string(), Box::new(AndroidUnitConverter::new()));
    providers
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Shared input checks and factor application.
fn convert_with(
    platform: &str,
    value: &TokenValue,
    category: TokenCategory,
    factor: &ConversionFactor,
    decimals: Option<i32>,
) -> Result<PlatformValue, ConversionError> {
    match value {
        TokenValue::Text(text) => {
            if category.is_categorical() {
                Ok(PlatformValue::new(text.clone(), category.as_str()))
            } else {
                Err(ConversionError::TextForNumericCategory {
                    platform: platform.to_string(),
                    category,
                    value: text.clone(),
                })
            }
        }
        TokenValue::Number(n) => {
            if category.is_categorical() {
                return Err(ConversionError::NumberForCategoricalCategory {
                    platform: platform.to_string(),
                    category,
                    value: *n,
                });
            }
            if !n.is_finite() {
                return Err(ConversionError::NonFiniteValue {
                    platform: platform.to_string(),
                    category,
                    value: *n,
                });
            }
            let converted = n * factor.factor;
            let converted = match decimals {
                Some(d) => round_to(converted, d),
                None => converted,
            };
            Ok(PlatformValue::new(converted, factor.unit.as_str()))
        }
    }
}

// --- Web ---

pub struct WebUnitConverter {
    base_font_size: f64,
}

impl WebUnitConverter {
    pub const DEFAULT_BASE_FONT_SIZE: f64 = 16.0;
    pub const REM_DECIMALS: i32 = 3;

    pub fn new() -> Self {
        Self::with_base_font_size(Self::DEFAULT_BASE_FONT_SIZE)
    }

    pub fn with_base_font_size(base_font_size: f64) -> Self {
        Self { base_font_size }
    }

    pub fn base_font_size(&self) -> f64 {
        self.base_font_size
    }

    pub fn px_to_rem(&self, px: f64) -> f64 {
        px / self.base_font_size
    }

    pub fn rem_to_px(&self, rem: f64) -> f64 {
        rem * self.base_font_size
    }
}

impl Default for WebUnitConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitProvider for WebUnitConverter {
    fn platform(&self) -> &str {
        "web"
    }

    fn convert_value(
        &self,
        value: &TokenValue,
        category: TokenCategory,
    ) -> Result<PlatformValue, ConversionError> {
        let factor = self.conversion_factor(category);
        let decimals = (category == TokenCategory::FontSize).then_some(Self::REM_DECIMALS);
        convert_with(self.platform(), value, category, &factor, decimals)
    }

    fn conversion_factor(&self, category: TokenCategory) -> ConversionFactor {
        match category {
            TokenCategory::FontSize => ConversionFactor::new(1.0 / self.base_font_size, "rem"),
            TokenCategory::LineHeight
            | TokenCategory::Density
            | TokenCategory::Blend
            | TokenCategory::Opacity => ConversionFactor::new(1.0, "unitless"),
            TokenCategory::FontWeight => ConversionFactor::new(1.0, "fontWeight"),
            TokenCategory::LetterSpacing => ConversionFactor::new(1.0, "em"),
            TokenCategory::FontFamily | TokenCategory::Color => {
                ConversionFactor::new(1.0, category.as_str())
            }
            TokenCategory::Spacing
            | TokenCategory::Radius
            | TokenCategory::TapArea
            | TokenCategory::BorderWidth => ConversionFactor::new(1.0, "px"),
        }
    }
}

// --- iOS ---

pub struct IosUnitConverter {
    display_scale: f64,
}

impl IosUnitConverter {
    pub fn new() -> Self {
        Self::with_display_scale(1.0)
    }

    pub fn with_display_scale(display_scale: f64) -> Self {
        Self { display_scale }
    }

    pub fn display_scale(&self) -> f64 {
        self.display_scale
    }

    pub fn points_to_pixels(&self, points: f64, scale: f64) -> f64 {
        points * scale
    }

    pub fn pixels_to_points(&self, pixels: f64, scale: f64) -> f64 {
        pixels / scale
    }
}

impl Default for IosUnitConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitProvider for IosUnitConverter {
    fn platform(&self) -> &str {
        "ios"
    }

    fn convert_value(
        &self,
        value: &TokenValue,
        category: TokenCategory,
    ) -> Result<PlatformValue, ConversionError> {
        let factor = self.conversion_factor(category);
        convert_with(self.platform(), value, category, &factor, None)
    }

    // Points are scale-independent, so the display scale never enters the factor.
    fn conversion_factor(&self, category: TokenCategory) -> ConversionFactor {
        match category {
            TokenCategory::LineHeight
            | TokenCategory::Density
            | TokenCategory::Blend
            | TokenCategory::Opacity => ConversionFactor::new(1.0, "unitless"),
            TokenCategory::FontWeight => ConversionFactor::new(1.0, "fontWeight"),
            TokenCategory::LetterSpacing => ConversionFactor::new(1.0, "em"),
            TokenCategory::FontFamily | TokenCategory::Color => {
                ConversionFactor::new(1.0, category.as_str())
            }
            TokenCategory::Spacing
            | TokenCategory::Radius
            | TokenCategory::FontSize
            | TokenCategory::TapArea
            | TokenCategory::BorderWidth => ConversionFactor::new(1.0, "pt"),
        }
    }
}

// --- Android ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AndroidDensity {
    Ldpi,
    #[default]
    Mdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
    Xxxhdpi,
}

impl AndroidDensity {
    pub const ALL: [AndroidDensity; 6] = [
        Self::Ldpi,
        Self::Mdpi,
        Self::Hdpi,
        Self::Xhdpi,
        Self::Xxhdpi,
        Self::Xxxhdpi,
    ];

    pub fn factor(&self) -> f64 {
        match self {
            Self::Ldpi => 0.75,
            Self::Mdpi => 1.0,
            Self::Hdpi => 1.5,
            Self::Xhdpi => 2.0,
            Self::Xxhdpi => 3.0,
            Self::Xxxhdpi => 4.0,
        }
    }
}

pub struct AndroidUnitConverter {
    density: AndroidDensity,
}

impl AndroidUnitConverter {
    pub fn new() -> Self {
        Self::with_density(AndroidDensity::default())
    }

    pub fn with_density(density: AndroidDensity) -> Self {
        Self { density }
    }

    pub fn density(&self) -> AndroidDensity {
        self.density
    }

    pub fn density_factor(&self) -> f64 {
        self.density.factor()
    }

    pub fn dp_to_pixels(&self, dp: f64, density: AndroidDensity) -> f64 {
        dp * density.factor()
    }

    pub fn pixels_to_dp(&self, pixels: f64, density: AndroidDensity) -> f64 {
        pixels / density.factor()
    }

    pub fn sp_to_pixels(&self, sp: f64, density: AndroidDensity, font_scale: f64) -> f64 {
        sp * density.factor() * font_scale
    }

    /// A dp/sp value must stay renderable in every density bucket.
    pub fn validate_across_densities(&self, value: f64, _category: TokenCategory) -> bool {
        if !value.is_finite() || value < 0.0 || value >= MAX_REASONABLE_VALUE {
            return false;
        }
        AndroidDensity::ALL
            .iter()
            .all(|d| self.dp_to_pixels(value, *d).is_finite())
    }
}

impl Default for AndroidUnitConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitProvider for AndroidUnitConverter {
    fn platform(&self) -> &str {
        "android"
    }

    fn convert_value(
        &self,
        value: &TokenValue,
        category: TokenCategory,
    ) -> Result<PlatformValue, ConversionError> {
        let factor = self.conversion_factor(category);
        convert_with(self.platform(), value, category, &factor, None)
    }

    fn conversion_factor(&self, category: TokenCategory) -> ConversionFactor {
        match category {
            TokenCategory::FontSize => ConversionFactor::new(1.0, "sp"),
            TokenCategory::LineHeight
            | TokenCategory::Density
            | TokenCategory::Blend
            | TokenCategory::Opacity => ConversionFactor::new(1.0, "unitless"),
            TokenCategory::FontWeight => ConversionFactor::new(1.0, "fontWeight"),
            TokenCategory::LetterSpacing => ConversionFactor::new(1.0, "em"),
            TokenCategory::FontFamily | TokenCategory::Color => {
                ConversionFactor::new(1.0, category.as_str())
            }
            TokenCategory::Spacing
            | TokenCategory::Radius
            | TokenCategory::TapArea
            | TokenCategory::BorderWidth => ConversionFactor::new(1.0, "dp"),
        }
    }
}
