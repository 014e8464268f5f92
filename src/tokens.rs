//! Token Model - Immutable Inputs to the Engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Unit string marking a platform whose provider failed to convert.
pub const ERROR_UNIT: &str = "error";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TokenCategory {
    Spacing,
    Radius,
    FontSize,
    FontFamily,
    FontWeight,
    LineHeight,
    LetterSpacing,
    TapArea,
    Density,
    Blend,
    Opacity,
    BorderWidth,
    Color,
}

impl TokenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spacing => "spacing",
            Self::Radius => "radius",
            Self::FontSize => "fontSize",
            Self::FontFamily => "fontFamily",
            Self::FontWeight => "fontWeight",
            Self::LineHeight => "lineHeight",
            Self::LetterSpacing => "letterSpacing",
            Self::TapArea => "tapArea",
            Self::Density => "density",
            Self::Blend => "blend",
            Self::Opacity => "opacity",
            Self::BorderWidth => "borderWidth",
            Self::Color => "color",
        }
    }

    /// Categories whose values are names rather than magnitudes.
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::FontFamily | Self::Color)
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token value: a magnitude for most categories, a name for categorical ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Number(f64),
    Text(String),
}

impl TokenValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for TokenValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TokenValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A primitive design token as defined by the token tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveToken {
    pub name: String,
    pub category: TokenCategory,
    pub base_value: TokenValue,
    #[serde(default, alias = "isStrategicFlexibility")]
    pub strategic_flexibility: bool,
    #[serde(default)]
    pub baseline_grid_alignment: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl PrimitiveToken {
    pub fn new(name: impl Into<String>, category: TokenCategory, base_value: impl Into<TokenValue>) -> Self {
        Self {
            name: name.into(),
            category,
            base_value: base_value.into(),
            strategic_flexibility: false,
            baseline_grid_alignment: false,
            description: None,
        }
    }

    pub fn with_strategic_flexibility(mut self, flexible: bool) -> Self {
        self.strategic_flexibility = flexible;
        self
    }

    pub fn with_baseline_grid_alignment(mut self, aligned: bool) -> Self {
        self.baseline_grid_alignment = aligned;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A provider's converted value for one platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformValue {
    pub value: TokenValue,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlatformValue {
    pub fn new(value: impl Into<TokenValue>, unit: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            unit: unit.into(),
            error: None,
        }
    }

    /// Sentinel recorded when a provider cannot convert a token.
    pub fn conversion_error(base_value: TokenValue, message: impl Into<String>) -> Self {
        Self {
            value: base_value,
            unit: ERROR_UNIT.to_string(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.unit == ERROR_UNIT
    }
}

/// Platform id -> converted value. Ordered so pair naming is deterministic.
pub type PlatformValues = BTreeMap<String, PlatformValue>;

/// Token set - loads token tables handed over by the embedder
#[derive(Debug)]
pub struct TokenSet {
    tokens: Vec<PrimitiveToken>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let tokens: Vec<PrimitiveToken> = serde_json::from_str(content)?;
        Ok(Self { tokens })
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, name: &str) -> Option<&PrimitiveToken> {
        self.tokens.iter().find(|t| t.name == name)
    }

    pub fn tokens(&self) -> &[PrimitiveToken] {
        &self.tokens
    }

    pub fn register(&mut self, token: PrimitiveToken) {
        match self.tokens.iter_mut().find(|t| t.name == token.name) {
            Some(existing) => *existing = token,
            None => self.tokens.push(token),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_deserializes_camel_case() {
        let json = r#"{
            "name": "space100",
            "category": "spacing",
            "baseValue": 8,
            "baselineGridAlignment": true
        }"#;
        let token: PrimitiveToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.category, TokenCategory::Spacing);
        assert_eq!(token.base_value, TokenValue::Number(8.0));
        assert!(token.baseline_grid_alignment);
        assert!(!token.strategic_flexibility);
    }

    #[test]
    fn test_text_base_value() {
        let json = r#"{"name": "fontFamilyBody", "category": "fontFamily", "baseValue": "Inter, sans-serif"}"#;
        let token: PrimitiveToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.base_value.as_text(), Some("Inter, sans-serif"));
    }

    #[test]
    fn test_value_display_drops_trailing_zero() {
        assert_eq!(TokenValue::Number(44.0).to_string(), "44");
        assert_eq!(TokenValue::Number(0.813).to_string(), "0.813");
    }

    #[test]
    fn test_error_sentinel() {
        let v = PlatformValue::conversion_error(TokenValue::Number(16.0), "boom");
        assert!(v.is_error());
        assert_eq!(v.unit, "error");
        assert_eq!(v.value, TokenValue::Number(16.0));
    }

    #[test]
    fn test_token_set_register_replaces_by_name() {
        let mut set = TokenSet::new();
        set.register(PrimitiveToken::new("space100", TokenCategory::Spacing, 8.0));
        set.register(PrimitiveToken::new("space100", TokenCategory::Spacing, 9.0));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("space100").unwrap().base_value, TokenValue::Number(9.0));
    }
}
