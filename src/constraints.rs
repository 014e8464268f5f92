//! Platform Constraint Handler - Hard Limits Separate From Tolerance
//!
//! Rules detect platform limits (accessibility floors, rendering floors,
//! numeric bounds) that no tolerance can excuse. Handling substitutes the
//! corrected value and reports what that did to cross-platform proportions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::providers::{round_to, MAX_REASONABLE_VALUE};
use crate::tokens::{PlatformValues, TokenCategory, TokenValue};

/// Relative change in a pair ratio beyond which proportionality counts as broken.
pub const PROPORTIONALITY_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ConstraintKind {
    Rounding,
    ValueBounds,
    ConversionPrecision,
    Rendering,
    Accessibility,
    FontSystem,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConstraint {
    pub kind: ConstraintKind,
    pub platforms: Vec<String>,
    pub category: TokenCategory,
    pub original_value: f64,
    pub constrained_value: f64,
    pub severity: ConstraintSeverity,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConstraintHandlingResult {
    pub has_constraints: bool,
    pub constraints: Vec<PlatformConstraint>,
    pub adjusted_values: PlatformValues,
    pub strategy: String,
    pub consistency_assessment: String,
}

/// What a rule sees for one platform.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Value as the platform expresses it.
    pub value: f64,
    pub unit: &'a str,
    /// Token base value before conversion, when the caller knows it.
    pub source: Option<f64>,
}

/// One `(platform, category, check)` entry of the registry.
///
/// `check` returns the corrected value, in the platform's unit, when the
/// input violates the limit.
#[derive(Debug, Clone)]
pub struct ConstraintRule {
    pub platform: &'static str,
    pub category: TokenCategory,
    pub kind: ConstraintKind,
    pub severity: ConstraintSeverity,
    pub check: fn(&RuleInput<'_>) -> Option<f64>,
    pub description: &'static str,
    pub impact: &'static str,
    pub recommendation: &'static str,
}

impl ConstraintRule {
    fn applies_to(&self, platform: &str, category: TokenCategory) -> bool {
        self.platform == platform && self.category == category
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<PlatformConstraint> {
        let corrected = (self.check)(input)?;
        Some(PlatformConstraint {
            kind: self.kind,
            platforms: vec![self.platform.to_string()],
            category: self.category,
            original_value: input.value,
            constrained_value: corrected,
            severity: self.severity,
            description: self.description.to_string(),
            impact: self.impact.to_string(),
            recommendation: self.recommendation.to_string(),
        })
    }
}

// --- Checks ---

/// Root font size the rem-precision rule assumes.
const WEB_ROOT_FONT_SIZE: f64 = 16.0;

fn web_min_font_size(input: &RuleInput<'_>) -> Option<f64> {
    (input.value < 0.5).then_some(0.5)
}

/// Judged on the pre-conversion pixel size. A rem value without a known
/// source is scaled back by the root font size.
fn web_rem_precision(input: &RuleInput<'_>) -> Option<f64> {
    let in_rem = input.unit == "rem";
    let px = match (in_rem, input.source) {
        (true, Some(source)) => source,
        (true, None) => input.value * WEB_ROOT_FONT_SIZE,
        (false, _) => input.value,
    };
    if px <= 10.0 {
        return None;
    }
    let rem = px / WEB_ROOT_FONT_SIZE;
    let scaled = rem * 1000.0;
    if (scaled - scaled.round()).abs() <= 1e-9 {
        return None;
    }
    let rounded = round_to(rem, 3);
    Some(if in_rem {
        rounded
    } else {
        rounded * WEB_ROOT_FONT_SIZE
    })
}

fn ios_min_tap_area(input: &RuleInput<'_>) -> Option<f64> {
    (input.value < 44.0).then_some(44.0)
}

fn android_min_tap_area(input: &RuleInput<'_>) -> Option<f64> {
    (input.value < 48.0).then_some(48.0)
}

fn font_weight_bounds(input: &RuleInput<'_>) -> Option<f64> {
    if input.value < 100.0 {
        Some(100.0)
    } else if input.value > 900.0 {
        Some(900.0)
    } else {
        None
    }
}

const FONT_WEIGHT_DESCRIPTION: &str =
    "Font weight outside the 100-900 range supported by platform font systems";
const FONT_WEIGHT_IMPACT: &str = "Weight clamped to the nearest supported value";
const FONT_WEIGHT_RECOMMENDATION: &str = "Use font weights between 100 and 900";

const fn font_weight_rule(platform: &'static str) -> ConstraintRule {
    ConstraintRule {
        platform,
        category: TokenCategory::FontWeight,
        kind: ConstraintKind::FontSystem,
        severity: ConstraintSeverity::Low,
        check: font_weight_bounds,
        description: FONT_WEIGHT_DESCRIPTION,
        impact: FONT_WEIGHT_IMPACT,
        recommendation: FONT_WEIGHT_RECOMMENDATION,
    }
}

pub const BUILTIN_RULES: &[ConstraintRule] = &[
    ConstraintRule {
        platform: "web",
        category: TokenCategory::FontSize,
        kind: ConstraintKind::Rendering,
        severity: ConstraintSeverity::Medium,
        check: web_min_font_size,
        description: "Web browsers may not render fonts smaller than 0.5rem reliably",
        impact: "Font size raised to the browser rendering floor",
        recommendation: "Use font sizes of at least 8px (0.5rem) on web",
    },
    ConstraintRule {
        platform: "web",
        category: TokenCategory::FontSize,
        kind: ConstraintKind::ConversionPrecision,
        severity: ConstraintSeverity::Low,
        check: web_rem_precision,
        description: "REM conversion needs more than 3 decimal places; rounded to 3",
        impact: "Sub-pixel difference after REM rounding",
        recommendation: "Prefer font sizes that divide evenly into REM units",
    },
    ConstraintRule {
        platform: "ios",
        category: TokenCategory::TapArea,
        kind: ConstraintKind::Accessibility,
        severity: ConstraintSeverity::High,
        check: ios_min_tap_area,
        description: "iOS Human Interface Guidelines require a minimum tap area of 44pt",
        impact: "Tap area enlarged to the iOS accessibility minimum",
        recommendation: "Use tap areas of at least 44pt on iOS",
    },
    ConstraintRule {
        platform: "android",
        category: TokenCategory::TapArea,
        kind: ConstraintKind::Accessibility,
        severity: ConstraintSeverity::High,
        check: android_min_tap_area,
        description: "Material Design requires a minimum touch target of 48dp",
        impact: "Touch target enlarged to the Android accessibility minimum",
        recommendation: "Use touch targets of at least 48dp on Android",
    },
    font_weight_rule("web"),
    font_weight_rule("ios"),
    font_weight_rule("android"),
];

pub struct PlatformConstraintHandler {
    rules: Vec<ConstraintRule>,
}

impl PlatformConstraintHandler {
    pub fn new() -> Self {
        Self {
            rules: BUILTIN_RULES.to_vec(),
        }
    }

    /// Adds an embedder-defined rule after the built-in ones.
    pub fn with_rule(mut self, rule: ConstraintRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ConstraintRule] {
        &self.rules
    }

    /// `source_value` is the token's base value before conversion, if known.
    pub fn identify_constraints(
        &self,
        token_name: &str,
        category: TokenCategory,
        source_value: Option<f64>,
        values: &PlatformValues,
    ) -> Vec<PlatformConstraint> {
        let mut constraints = vec![];

        for (platform, value) in values {
            if value.is_error() {
                continue;
            }
            let Some(number) = value.value.as_number() else {
                continue;
            };
            let input = RuleInput {
                value: number,
                unit: &value.unit,
                source: source_value,
            };
            constraints.extend(
                self.rules
                    .iter()
                    .filter(|r| r.applies_to(platform, category))
                    .filter_map(|r| r.evaluate(&input)),
            );
        }

        if !constraints.is_empty() {
            debug!(token = token_name, count = constraints.len(), "platform constraints identified");
        }
        constraints
    }

    pub fn handle_constraints(
        &self,
        token_name: &str,
        category: TokenCategory,
        source_value: Option<f64>,
        values: &PlatformValues,
    ) -> ConstraintHandlingResult {
        let constraints = self.identify_constraints(token_name, category, source_value, values);

        if constraints.is_empty() {
            return ConstraintHandlingResult {
                has_constraints: false,
                constraints,
                adjusted_values: values.clone(),
                strategy: "No constraints identified - using original values".to_string(),
                consistency_assessment: "Mathematical consistency preserved across all platforms"
                    .to_string(),
            };
        }

        let mut adjusted = values.clone();
        let mut strategy = vec![];

        for constraint in &constraints {
            for platform in &constraint.platforms {
                if let Some(entry) = adjusted.get_mut(platform) {
                    entry.value = TokenValue::Number(constraint.constrained_value);
                }
                strategy.push(format!(
                    "{}: {} ({} → {})",
                    platform,
                    constraint.description,
                    constraint.original_value,
                    constraint.constrained_value
                ));
            }
        }

        let consistency_assessment = assess_consistency(&constraints, values, &adjusted);

        ConstraintHandlingResult {
            has_constraints: true,
            constraints,
            adjusted_values: adjusted,
            strategy: strategy.join("; "),
            consistency_assessment,
        }
    }

    /// Fails when a high-severity constraint was left out of the strategy or an
    /// adjusted value lies outside `[0, 10000]`.
    pub fn validate_constraint_handling(&self, result: &ConstraintHandlingResult) -> bool {
        let high_severity_handled = result
            .constraints
            .iter()
            .filter(|c| c.severity == ConstraintSeverity::High)
            .flat_map(|c| c.platforms.iter())
            .all(|p| result.strategy.contains(p.as_str()));

        let values_reasonable = result
            .adjusted_values
            .values()
            .filter_map(|v| v.value.as_number())
            .all(|n| (0.0..=MAX_REASONABLE_VALUE).contains(&n));

        high_severity_handled && values_reasonable
    }

    pub fn constraint_documentation(
        &self,
    ) -> BTreeMap<&'static str, BTreeMap<TokenCategory, &'static str>> {
        let font_weight = "Numeric font weights must stay within 100-900";
        let mut docs = BTreeMap::new();

        docs.insert(
            "web",
            BTreeMap::from([
                (
                    TokenCategory::FontSize,
                    "Minimum 0.5rem for reliable rendering; REM values rounded to 3 decimal places",
                ),
                (TokenCategory::FontWeight, font_weight),
            ]),
        );
        docs.insert(
            "ios",
            BTreeMap::from([
                (
                    TokenCategory::TapArea,
                    "Minimum 44pt tap area per Human Interface Guidelines",
                ),
                (TokenCategory::FontWeight, font_weight),
            ]),
        );
        docs.insert(
            "android",
            BTreeMap::from([
                (
                    TokenCategory::TapArea,
                    "Minimum 48dp touch target per Material Design",
                ),
                (TokenCategory::FontWeight, font_weight),
            ]),
        );

        docs
    }
}

impl Default for PlatformConstraintHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn assess_consistency(
    constraints: &[PlatformConstraint],
    original: &PlatformValues,
    adjusted: &PlatformValues,
) -> String {
    let has = |s: ConstraintSeverity| constraints.iter().any(|c| c.severity == s);
    let mut parts = vec![];

    if has(ConstraintSeverity::High) {
        parts.push("High-severity constraints applied: Platform requirements enforced");
    }
    if has(ConstraintSeverity::Medium) {
        parts.push("Medium-severity constraints applied: Platform optimization applied");
    }
    if has(ConstraintSeverity::Low) {
        parts.push("Low-severity constraints applied: Minor precision adjustments");
    }

    if proportions_maintained(original, adjusted) {
        parts.push("Cross-platform proportional relationships maintained");
    } else {
        parts.push("Some proportional relationships affected by constraint handling");
    }

    parts.join("; ")
}

/// Compares every numeric pair's ratio before and after adjustment.
pub fn proportions_maintained(original: &PlatformValues, adjusted: &PlatformValues) -> bool {
    let numeric = |values: &PlatformValues, platform: &str| {
        values
            .get(platform)
            .filter(|v| !v.is_error())
            .and_then(|v| v.value.as_number())
    };
    let platforms: Vec<&String> = original.keys().collect();

    for (i, a) in platforms.iter().enumerate() {
        for b in &platforms[i + 1..] {
            let (Some(a_orig), Some(b_orig), Some(a_adj), Some(b_adj)) = (
                numeric(original, a.as_str()),
                numeric(original, b.as_str()),
                numeric(adjusted, a.as_str()),
                numeric(adjusted, b.as_str()),
            ) else {
                continue;
            };
            if b_orig == 0.0 || b_adj == 0.0 {
                continue;
            }
            let before = a_orig / b_orig;
            let after = a_adj / b_adj;
            if before == 0.0 {
                continue;
            }
            if ((after - before) / before).abs() > PROPORTIONALITY_THRESHOLD {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::PlatformValue;

    fn values(web: (f64, &str), ios: (f64, &str), android: (f64, &str)) -> PlatformValues {
        BTreeMap::from([
            ("web".to_string(), PlatformValue::new(web.0, web.1)),
            ("ios".to_string(), PlatformValue::new(ios.0, ios.1)),
            ("android".to_string(), PlatformValue::new(android.0, android.1)),
        ])
    }

    fn uniform(value: f64, unit: &str) -> PlatformValues {
        values((value, unit), (value, unit), (value, unit))
    }

    #[test]
    fn test_web_min_font_size() {
        let handler = PlatformConstraintHandler::new();
        let constraints = handler.identify_constraints(
            "fontSize-tiny",
            TokenCategory::FontSize,
            None,
            &values((0.3, "rem"), (5.0, "pt"), (5.0, "sp")),
        );
        assert_eq!(constraints.len(), 1);
        let web = &constraints[0];
        assert_eq!(web.platforms, vec!["web"]);
        assert_eq!(web.kind, ConstraintKind::Rendering);
        assert_eq!(web.constrained_value, 0.5);
        assert_eq!(web.severity, ConstraintSeverity::Medium);
    }

    #[test]
    fn test_web_rem_precision() {
        let handler = PlatformConstraintHandler::new();
        let constraints = handler.identify_constraints(
            "fontSize-precise",
            TokenCategory::FontSize,
            None,
            &values((18.123456789, "px"), (18.0, "pt"), (18.0, "sp")),
        );
        let precision = constraints
            .iter()
            .find(|c| c.kind == ConstraintKind::ConversionPrecision)
            .unwrap();
        assert_eq!(precision.severity, ConstraintSeverity::Low);
        assert!((precision.constrained_value - 18.128).abs() < 1e-9);

        // 24px is exactly 1.5rem
        let clean = handler.identify_constraints(
            "fontSize-clean",
            TokenCategory::FontSize,
            None,
            &values((24.0, "px"), (24.0, "pt"), (24.0, "sp")),
        );
        assert!(clean.is_empty());
    }

    #[test]
    fn test_web_rem_precision_uses_source_pixels() {
        let handler = PlatformConstraintHandler::new();

        // 13px is 0.8125rem, stored as 0.813
        let constraints = handler.identify_constraints(
            "fontSize050",
            TokenCategory::FontSize,
            Some(13.0),
            &values((0.813, "rem"), (13.0, "pt"), (13.0, "sp")),
        );
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].kind, ConstraintKind::ConversionPrecision);
        assert_eq!(constraints[0].severity, ConstraintSeverity::Low);
        assert_eq!(constraints[0].constrained_value, 0.813);

        // 200px is exactly 12.5rem
        let clean = handler.identify_constraints(
            "fontSize900",
            TokenCategory::FontSize,
            Some(200.0),
            &values((12.5, "rem"), (200.0, "pt"), (200.0, "sp")),
        );
        assert!(clean.is_empty());

        // below the 10px threshold nothing fires
        let small = handler.identify_constraints(
            "fontSize025",
            TokenCategory::FontSize,
            Some(9.0),
            &values((0.563, "rem"), (9.0, "pt"), (9.0, "sp")),
        );
        assert!(small.is_empty());
    }

    #[test]
    fn test_web_rem_precision_without_source() {
        let handler = PlatformConstraintHandler::new();
        // 1.5rem scales back to 24px, which converts cleanly
        let clean = handler.identify_constraints(
            "fontSize",
            TokenCategory::FontSize,
            None,
            &values((1.5, "rem"), (24.0, "pt"), (24.0, "sp")),
        );
        assert!(clean.is_empty());
    }

    #[test]
    fn test_tap_area_minimums() {
        let handler = PlatformConstraintHandler::new();
        let constraints = handler.identify_constraints(
            "tapArea-small",
            TokenCategory::TapArea,
            None,
            &values((32.0, "px"), (32.0, "pt"), (32.0, "dp")),
        );
        assert_eq!(constraints.len(), 2);

        let ios = constraints.iter().find(|c| c.platforms == ["ios"]).unwrap();
        assert_eq!(ios.constrained_value, 44.0);
        assert_eq!(ios.severity, ConstraintSeverity::High);
        assert_eq!(ios.kind, ConstraintKind::Accessibility);
        assert!(ios.description.contains("44pt"));

        let android = constraints.iter().find(|c| c.platforms == ["android"]).unwrap();
        assert_eq!(android.constrained_value, 48.0);
        assert!(android.description.contains("48dp"));
    }

    #[test]
    fn test_android_only_between_minimums() {
        let handler = PlatformConstraintHandler::new();
        let constraints = handler.identify_constraints(
            "tapArea-mid",
            TokenCategory::TapArea,
            None,
            &uniform(46.0, "px"),
        );
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].platforms, vec!["android"]);
    }

    #[test]
    fn test_font_weight_inside_bounds_untouched() {
        let handler = PlatformConstraintHandler::new();
        for weight in [350.0, 450.0, 100.0, 900.0] {
            let constraints = handler.identify_constraints(
                "fontWeight-custom",
                TokenCategory::FontWeight,
                None,
                &uniform(weight, "fontWeight"),
            );
            assert!(constraints.is_empty(), "weight {} was flagged", weight);
        }
    }

    #[test]
    fn test_font_weight_clamped_on_every_platform() {
        let handler = PlatformConstraintHandler::new();
        let low = handler.identify_constraints("w", TokenCategory::FontWeight, None, &uniform(50.0, "fontWeight"));
        assert_eq!(low.len(), 3);
        assert!(low.iter().all(|c| c.constrained_value == 100.0 && c.kind == ConstraintKind::FontSystem));

        let high = handler.identify_constraints("w", TokenCategory::FontWeight, None, &uniform(1000.0, "fontWeight"));
        assert_eq!(high.len(), 3);
        assert!(high.iter().all(|c| c.constrained_value == 900.0));
    }

    #[test]
    fn test_text_and_error_values_skipped() {
        let handler = PlatformConstraintHandler::new();
        let mut mixed: PlatformValues = BTreeMap::new();
        mixed.insert("web".into(), PlatformValue::new("Inter, sans-serif", "fontFamily"));
        mixed.insert(
            "ios".into(),
            PlatformValue::conversion_error(TokenValue::Number(10.0), "boom"),
        );
        assert!(handler.identify_constraints("t", TokenCategory::TapArea, None, &mixed).is_empty());
    }

    #[test]
    fn test_handle_without_constraints() {
        let handler = PlatformConstraintHandler::new();
        let original = uniform(16.0, "px");
        let result = handler.handle_constraints("space100", TokenCategory::Spacing, None, &original);
        assert!(!result.has_constraints);
        assert!(result.constraints.is_empty());
        assert_eq!(result.adjusted_values, original);
        assert!(result.strategy.contains("No constraints identified"));
        assert!(result.consistency_assessment.contains("Mathematical consistency preserved"));

        let empty = handler.handle_constraints("empty", TokenCategory::Spacing, None, &BTreeMap::new());
        assert!(!empty.has_constraints);
        assert!(empty.adjusted_values.is_empty());
    }

    #[test]
    fn test_handle_tap_area() {
        let handler = PlatformConstraintHandler::new();
        let result = handler.handle_constraints(
            "tapArea-small",
            TokenCategory::TapArea,
            None,
            &values((32.0, "px"), (32.0, "pt"), (32.0, "dp")),
        );
        assert!(result.has_constraints);
        assert_eq!(result.adjusted_values["ios"].value, TokenValue::Number(44.0));
        assert_eq!(result.adjusted_values["android"].value, TokenValue::Number(48.0));
        assert_eq!(result.adjusted_values["web"].value, TokenValue::Number(32.0));
        assert_eq!(result.adjusted_values["ios"].unit, "pt");
        assert!(result.strategy.contains("ios:"));
        assert!(result.strategy.contains("android:"));
        assert!(result.strategy.contains("(32 → 44)"));
        assert!(result.strategy.contains("(32 → 48)"));
        assert!(result.consistency_assessment.contains("High-severity constraints applied"));
        assert!(result.consistency_assessment.contains("Platform requirements enforced"));
        assert!(result
            .consistency_assessment
            .contains("Some proportional relationships affected"));
        assert!(handler.validate_constraint_handling(&result));
    }

    #[test]
    fn test_handle_medium_and_low_narratives() {
        let handler = PlatformConstraintHandler::new();
        let medium = handler.handle_constraints(
            "fontSize-small",
            TokenCategory::FontSize,
            None,
            &values((0.4, "rem"), (6.0, "pt"), (6.0, "sp")),
        );
        assert_eq!(medium.adjusted_values["web"].value, TokenValue::Number(0.5));
        assert!(medium.strategy.contains("Web browsers may not render fonts smaller"));
        assert!(medium.consistency_assessment.contains("Platform optimization applied"));

        let low = handler.handle_constraints(
            "fontWeight-extreme",
            TokenCategory::FontWeight,
            None,
            &uniform(50.0, "fontWeight"),
        );
        assert!(low.consistency_assessment.contains("Low-severity constraints applied"));
        assert!(low.consistency_assessment.contains("Minor precision adjustments"));
        // every platform moved by the same amount
        assert!(low
            .consistency_assessment
            .contains("proportional relationships maintained"));
    }

    #[test]
    fn test_proportionality_threshold() {
        let original = uniform(100.0, "px");
        let mut slightly = original.clone();
        slightly.get_mut("ios").unwrap().value = TokenValue::Number(104.0);
        assert!(proportions_maintained(&original, &slightly));

        let mut broken = original.clone();
        broken.get_mut("ios").unwrap().value = TokenValue::Number(106.0);
        assert!(!proportions_maintained(&original, &broken));
    }

    #[test]
    fn test_proportionality_skips_text_and_errors() {
        let mut original = uniform(100.0, "px");
        original.insert("watch".into(), PlatformValue::new("system", "fontFamily"));
        original.insert(
            "tv".into(),
            PlatformValue::conversion_error(TokenValue::Number(100.0), "unsupported"),
        );

        let mut adjusted = original.clone();
        adjusted.get_mut("ios").unwrap().value = TokenValue::Number(102.0);
        adjusted.get_mut("watch").unwrap().value = TokenValue::from("other");
        assert!(proportions_maintained(&original, &adjusted));

        adjusted.get_mut("ios").unwrap().value = TokenValue::Number(150.0);
        assert!(!proportions_maintained(&original, &adjusted));
    }

    #[test]
    fn test_proportionality_skips_zero_denominators() {
        let original = values((0.0, "px"), (0.0, "pt"), (0.0, "dp"));
        let mut adjusted = original.clone();
        adjusted.get_mut("ios").unwrap().value = TokenValue::Number(44.0);
        adjusted.get_mut("android").unwrap().value = TokenValue::Number(48.0);
        // every pair had a zero before adjustment
        assert!(proportions_maintained(&original, &adjusted));

        let original = values((10.0, "px"), (10.0, "pt"), (10.0, "dp"));
        let mut adjusted = original.clone();
        adjusted.get_mut("web").unwrap().value = TokenValue::Number(0.0);
        adjusted.get_mut("ios").unwrap().value = TokenValue::Number(10.2);
        // pairs ending in web lose their denominator; android-ios stays within 5%
        assert!(proportions_maintained(&original, &adjusted));
    }

    #[test]
    fn test_validate_constraint_handling_rejections() {
        let handler = PlatformConstraintHandler::new();
        let constraint = PlatformConstraint {
            kind: ConstraintKind::Accessibility,
            platforms: vec!["ios".into()],
            category: TokenCategory::TapArea,
            original_value: 32.0,
            constrained_value: 44.0,
            severity: ConstraintSeverity::High,
            description: "Test constraint".into(),
            impact: "Test impact".into(),
            recommendation: "Test recommendation".into(),
        };

        let ignored = ConstraintHandlingResult {
            has_constraints: true,
            constraints: vec![constraint.clone()],
            adjusted_values: uniform(32.0, "px"),
            strategy: "No adjustments made".into(),
            consistency_assessment: "No constraints handled".into(),
        };
        assert!(!handler.validate_constraint_handling(&ignored));

        let unreasonable = ConstraintHandlingResult {
            has_constraints: true,
            constraints: vec![],
            adjusted_values: values((-100.0, "px"), (44.0, "pt"), (15000.0, "dp")),
            strategy: "Test strategy".into(),
            consistency_assessment: "Test assessment".into(),
        };
        assert!(!handler.validate_constraint_handling(&unreasonable));

        let good = ConstraintHandlingResult {
            has_constraints: true,
            constraints: vec![constraint],
            adjusted_values: values((32.0, "px"), (44.0, "pt"), (32.0, "dp")),
            strategy: "ios: Test constraint (32 → 44)".into(),
            consistency_assessment: "High-severity constraints applied".into(),
        };
        assert!(handler.validate_constraint_handling(&good));
    }

    #[test]
    fn test_documentation() {
        let docs = PlatformConstraintHandler::new().constraint_documentation();
        assert!(docs["web"][&TokenCategory::FontSize].contains("0.5rem"));
        assert!(docs["ios"][&TokenCategory::TapArea].contains("44pt"));
        assert!(docs["android"][&TokenCategory::TapArea].contains("48dp"));
        for platform in ["web", "ios", "android"] {
            assert!(docs[platform][&TokenCategory::FontWeight].contains("100-900"));
        }
    }

    #[test]
    fn test_custom_rule() {
        fn web_min_radius(input: &RuleInput<'_>) -> Option<f64> {
            (input.value < 1.0).then_some(1.0)
        }
        let handler = PlatformConstraintHandler::new().with_rule(ConstraintRule {
            platform: "web",
            category: TokenCategory::Radius,
            kind: ConstraintKind::ValueBounds,
            severity: ConstraintSeverity::Low,
            check: web_min_radius,
            description: "Radius below one pixel",
            impact: "Rounded up",
            recommendation: "Use whole-pixel radii",
        });
        let constraints = handler.identify_constraints("r", TokenCategory::Radius, None, &uniform(0.5, "px"));
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].kind, ConstraintKind::ValueBounds);
    }
}
