//! Tolerance Calculator - Composable Deviation Budget
//!
//! The budget is additive: a floating-point noise floor, a conversion term for
//! categories whose units round, and a platform-constraint term. A per-category
//! override then replaces (not stacks on) the floor, and strategic flexibility
//! widens the whole budget.
//!
//! String-valued tokens have no budget at all: they must match exactly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::tokens::{TokenCategory, TokenValue};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToleranceError {
    #[error("numeric comparison requested for text operand {0:?}")]
    NonNumericOperand(String),

    #[error("tolerance {0} is not a non-negative number")]
    InvalidTolerance(f64),
}

/// Replaceable configuration table owned by one calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ToleranceConfig {
    pub base_tolerance: f64,
    pub conversion_tolerance: f64,
    pub constraint_tolerance: f64,
    pub relative_tolerance_factor: f64,
    pub strategic_flexibility_factor: f64,
    pub category_tolerances: BTreeMap<TokenCategory, f64>,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        let category_tolerances = [
            (TokenCategory::Spacing, 0.001),
            (TokenCategory::Radius, 0.001),
            (TokenCategory::TapArea, 0.001),
            (TokenCategory::FontSize, 0.005),
            (TokenCategory::LineHeight, 0.001),
            (TokenCategory::LetterSpacing, 0.001),
            (TokenCategory::Density, 0.001),
            (TokenCategory::BorderWidth, 0.001),
        ]
        .into_iter()
        .collect();

        Self {
            base_tolerance: 0.001,
            conversion_tolerance: 0.005,
            constraint_tolerance: 0.05,
            relative_tolerance_factor: 0.001,
            strategic_flexibility_factor: 1.1,
            category_tolerances,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceContext {
    pub category: TokenCategory,
    pub platforms: Vec<String>,
    pub has_unit_conversion: bool,
    pub has_platform_constraints: bool,
    pub base_value: TokenValue,
    pub strategic_flexibility: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBreakdown {
    pub base: f64,
    pub conversion: f64,
    pub platform_constraint: f64,
    pub category_adjustment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceResult {
    pub tolerance: f64,
    pub reasoning: String,
    pub breakdown: ToleranceBreakdown,
    pub requires_exact_match: bool,
}

impl ToleranceResult {
    fn exact_match() -> Self {
        Self {
            tolerance: 0.0,
            reasoning: "Exact match required for string values".to_string(),
            breakdown: ToleranceBreakdown::default(),
            requires_exact_match: true,
        }
    }

    /// Scales the budget by a caller-supplied factor and records it.
    pub fn scaled(mut self, multiplier: f64) -> Self {
        self.tolerance *= multiplier;
        self.reasoning
            .push_str(&format!("; Tolerance multiplier: ×{}", multiplier));
        self
    }
}

pub struct ToleranceCalculator {
    config: ToleranceConfig,
}

impl ToleranceCalculator {
    pub fn new() -> Self {
        Self::with_config(ToleranceConfig::default())
    }

    pub fn with_config(config: ToleranceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToleranceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ToleranceConfig) {
        self.config = config;
    }

    pub fn calculate_tolerance(&self, ctx: &ToleranceContext) -> ToleranceResult {
        if ctx.base_value.is_text() {
            return ToleranceResult::exact_match();
        }

        let base = self.config.base_tolerance;
        let mut reasoning = vec![format!("Base mathematical tolerance: {:.4}", base)];
        let mut tolerance = base;

        let conversion = if ctx.has_unit_conversion {
            self.conversion_component(ctx.category)
        } else {
            0.0
        };
        if conversion > 0.0 {
            tolerance += conversion;
            if ctx.category == TokenCategory::FontSize {
                reasoning.push(format!(
                    "fontSize conversion precision: +{:.4} (REM rounding)",
                    conversion
                ));
            } else {
                reasoning.push(format!(
                    "Unit conversion tolerance for {}: +{:.4}",
                    ctx.category, conversion
                ));
            }
        }

        let platform_constraint = if ctx.has_platform_constraints {
            let (component, notes) = self.constraint_component(&ctx.platforms, ctx.category);
            tolerance += component;
            reasoning.push(if notes.is_empty() {
                format!("Platform constraint tolerance: +{:.4}", component)
            } else {
                format!(
                    "Platform constraint tolerance: +{:.4} ({})",
                    component,
                    notes.join(", ")
                )
            });
            component
        } else {
            0.0
        };

        let category_tolerance = self.category_tolerance(ctx.category);
        let category_adjustment = category_tolerance - base;
        tolerance = tolerance - base + category_tolerance;
        if category_adjustment != 0.0 {
            reasoning.push(format!(
                "Category adjustment for {}: {:+.4}",
                ctx.category, category_adjustment
            ));
        }

        if ctx.strategic_flexibility {
            tolerance *= self.config.strategic_flexibility_factor;
            reasoning.push(format!(
                "Strategic flexibility: ×{}",
                self.config.strategic_flexibility_factor
            ));
        }

        debug!(
            category = %ctx.category,
            tolerance,
            "calculated tolerance"
        );

        ToleranceResult {
            tolerance,
            reasoning: reasoning.join("; "),
            breakdown: ToleranceBreakdown {
                base,
                conversion,
                platform_constraint,
                category_adjustment,
            },
            requires_exact_match: false,
        }
    }

    /// Absolute tolerance, widened proportionally for values of magnitude one or more.
    pub fn calculate_relative_tolerance(
        &self,
        base_value: &TokenValue,
        ctx: &ToleranceContext,
    ) -> ToleranceResult {
        let mut result = self.calculate_tolerance(ctx);
        if result.requires_exact_match {
            return result;
        }

        if let Some(value) = base_value.as_number() {
            if value.abs() >= 1.0 {
                let relative = self.config.relative_tolerance_factor * value.abs();
                let absolute = result.tolerance;
                result.tolerance = absolute.max(relative);
                result.reasoning.push_str(&format!(
                    "; Relative tolerance applied: {:.4} ({}% of {}, absolute {:.4})",
                    result.tolerance,
                    self.config.relative_tolerance_factor * 100.0,
                    value.abs(),
                    absolute
                ));
            }
        }

        result
    }

    pub fn is_within_tolerance(
        &self,
        a: &TokenValue,
        b: &TokenValue,
        result: &ToleranceResult,
    ) -> Result<bool, ToleranceError> {
        if result.requires_exact_match {
            return Ok(a == b);
        }
        if result.tolerance.is_nan() || result.tolerance < 0.0 {
            return Err(ToleranceError::InvalidTolerance(result.tolerance));
        }
        match (a, b) {
            (TokenValue::Number(x), TokenValue::Number(y)) => {
                Ok(self.is_within_numeric_tolerance(*x, *y, result))
            }
            (TokenValue::Text(s), _) | (_, TokenValue::Text(s)) => {
                Err(ToleranceError::NonNumericOperand(s.clone()))
            }
        }
    }

    pub fn is_within_numeric_tolerance(&self, a: f64, b: f64, result: &ToleranceResult) -> bool {
        if result.requires_exact_match {
            return a == b;
        }
        (a - b).abs() <= result.tolerance
    }

    fn conversion_component(&self, category: TokenCategory) -> f64 {
        let conversion = self.config.conversion_tolerance;
        match category {
            TokenCategory::FontSize => (conversion * 2.0).max(0.001),
            TokenCategory::Spacing
            | TokenCategory::Radius
            | TokenCategory::TapArea
            | TokenCategory::LineHeight
            | TokenCategory::Density
            | TokenCategory::BorderWidth => conversion * 0.1,
            TokenCategory::LetterSpacing => conversion * 0.3,
            _ => 0.0,
        }
    }

    fn constraint_component(&self, platforms: &[String], category: TokenCategory) -> (f64, Vec<&'static str>) {
        let has = |p: &str| platforms.iter().any(|x| x == p);
        let mut multiplier = 1.0;
        let mut notes = Vec::new();

        if has("android") {
            multiplier *= 1.1;
            notes.push("android density buckets");
        }
        if has("ios") {
            multiplier *= 1.05;
            notes.push("ios display scale");
        }
        if has("web") && category == TokenCategory::FontSize {
            multiplier *= 1.2;
            notes.push("web REM rounding");
        }
        if platforms.len() > 2 {
            multiplier *= 1.1;
            notes.push("multi-platform");
        }

        (self.config.constraint_tolerance * multiplier, notes)
    }

    fn category_tolerance(&self, category: TokenCategory) -> f64 {
        self.config
            .category_tolerances
            .get(&category)
            .copied()
            .unwrap_or(self.config.base_tolerance)
    }
}

impl Default for ToleranceCalculator {
    fn default() -> Self {
        Self::new()
    }
}
