//! Cross-Platform Consistency Validation - Orchestrator
//!
//! Converts one token through every provider, budgets a tolerance, resolves
//! hard platform constraints, then compares every platform pair.
//!
//! Inconsistency is a result, not an error.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::constraints::{ConstraintHandlingResult, ConstraintSeverity, PlatformConstraintHandler};
use crate::providers::ProviderMap;
use crate::tokens::{PlatformValue, PlatformValues, PrimitiveToken, TokenCategory, TokenValue};
use crate::tolerance::{ToleranceCalculator, ToleranceContext, ToleranceResult};

/// Minimum fraction of passing pairs for a token to count as consistent.
pub const MIN_CONSISTENCY_SCORE: f64 = 0.95;

pub const STRICT_MODE_INCONSISTENCY: &str = "Strict mode: constraints detected";

const COMMON_ISSUE_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ValidationOptions {
    pub use_relative_tolerance: bool,
    /// Reject any token that triggers a platform constraint, whatever its severity.
    pub strict_mode: bool,
    pub tolerance_multiplier: Option<f64>,
}

pub struct ValidationContext<'a> {
    pub token: &'a PrimitiveToken,
    pub providers: &'a ProviderMap,
    pub handle_constraints: bool,
    pub options: ValidationOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathematicalAnalysis {
    /// `"a-b"` -> value_a / value_b
    pub proportional_relationships: BTreeMap<String, f64>,
    pub max_deviation: f64,
    pub failed_pairs: Vec<String>,
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedConsistencyResult {
    pub token_name: String,
    pub category: TokenCategory,
    pub platforms: Vec<String>,
    pub is_consistent: bool,
    pub tolerance_level: f64,
    pub inconsistencies: Vec<String>,
    pub relationship_validation: String,
    pub platform_values: PlatformValues,
    pub tolerance_details: ToleranceResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_handling: Option<ConstraintHandlingResult>,
    pub mathematical_analysis: MathematicalAnalysis,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub total_tokens: usize,
    pub consistent_tokens: usize,
    pub inconsistent_tokens: usize,
    pub average_consistency_score: f64,
    pub common_issues: Vec<String>,
    pub platform_issues: BTreeMap<String, usize>,
}

/// Platform ids named by a failed-pair description such as `"ios-web (deviation: ...)"`.
fn platforms_in_pair(pair: &str) -> impl Iterator<Item = &str> {
    pair.split(' ')
        .next()
        .unwrap_or_default()
        .split('-')
        .filter(|p| !p.is_empty())
}

pub struct CrossPlatformValidator {
    calculator: ToleranceCalculator,
    handler: PlatformConstraintHandler,
}

impl CrossPlatformValidator {
    pub fn new(calculator: ToleranceCalculator, handler: PlatformConstraintHandler) -> Self {
        Self { calculator, handler }
    }

    pub fn calculator(&self) -> &ToleranceCalculator {
        &self.calculator
    }

    pub fn calculator_mut(&mut self) -> &mut ToleranceCalculator {
        &mut self.calculator
    }

    pub fn constraint_handler(&self) -> &PlatformConstraintHandler {
        &self.handler
    }

    pub fn validate_token(&self, ctx: &ValidationContext<'_>) -> DetailedConsistencyResult {
        let token = ctx.token;
        let platform_values = self.convert_to_platform_values(token, ctx.providers);

        let tolerance_ctx = ToleranceContext {
            category: token.category,
            platforms: ctx.providers.keys().cloned().collect(),
            has_unit_conversion: true,
            has_platform_constraints: ctx.handle_constraints,
            base_value: token.base_value.clone(),
            strategic_flexibility: token.strategic_flexibility,
        };

        let mut tolerance = if ctx.options.use_relative_tolerance {
            self.calculator
                .calculate_relative_tolerance(&token.base_value, &tolerance_ctx)
        } else {
            self.calculator.calculate_tolerance(&tolerance_ctx)
        };
        // non-positive multipliers are ignored
        if let Some(multiplier) = ctx.options.tolerance_multiplier.filter(|m| *m > 0.0) {
            tolerance = tolerance.scaled(multiplier);
        }

        let mut constraint_handling = None;
        let mut final_values = platform_values.clone();

        if ctx.handle_constraints {
            let handled = self
                .handler
                .handle_constraints(
                    &token.name,
                    token.category,
                    token.base_value.as_number(),
                    &platform_values,
                );

            if ctx.options.strict_mode && handled.has_constraints {
                warn!(
                    token = %token.name,
                    constraints = handled.constraints.len(),
                    "strict mode rejected token with platform constraints"
                );
                return strict_mode_failure(token, platform_values, tolerance, handled);
            }

            final_values = handled.adjusted_values.clone();
            constraint_handling = Some(handled);
        }

        let analysis = self.analyze_consistency(&final_values, &tolerance);
        let is_consistent = analysis.consistency_score >= MIN_CONSISTENCY_SCORE
            && analysis.failed_pairs.is_empty();

        debug!(
            token = %token.name,
            score = analysis.consistency_score,
            failed = analysis.failed_pairs.len(),
            is_consistent,
            "validated token"
        );

        let recommendations =
            generate_recommendations(token, &analysis, constraint_handling.as_ref());
        let inconsistencies = if analysis.failed_pairs.is_empty() {
            vec![]
        } else {
            vec![format!(
                "Failed consistency pairs: {}",
                analysis.failed_pairs.join(", ")
            )]
        };

        DetailedConsistencyResult {
            token_name: token.name.clone(),
            category: token.category,
            platforms: ctx.providers.keys().cloned().collect(),
            is_consistent,
            tolerance_level: tolerance.tolerance,
            inconsistencies,
            relationship_validation: describe_relationships(&analysis),
            platform_values: final_values,
            tolerance_details: tolerance,
            constraint_handling,
            mathematical_analysis: analysis,
            recommendations,
        }
    }

    /// Validates every token in parallel; output order matches input order.
    pub fn validate_tokens(
        &self,
        tokens: &[PrimitiveToken],
        providers: &ProviderMap,
        handle_constraints: bool,
        options: &ValidationOptions,
    ) -> Vec<DetailedConsistencyResult> {
        tokens
            .par_iter()
            .map(|token| {
                self.validate_token(&ValidationContext {
                    token,
                    providers,
                    handle_constraints,
                    options: options.clone(),
                })
            })
            .collect()
    }

    pub fn generate_summary_report(&self, results: &[DetailedConsistencyResult]) -> SummaryReport {
        let total_tokens = results.len();
        let consistent_tokens = results.iter().filter(|r| r.is_consistent).count();

        let average_consistency_score = if total_tokens == 0 {
            1.0
        } else {
            results
                .iter()
                .map(|r| r.mathematical_analysis.consistency_score)
                .sum::<f64>()
                / total_tokens as f64
        };

        let mut platform_issues: BTreeMap<String, usize> = BTreeMap::new();
        // insertion order breaks frequency ties
        let mut issue_frequency: Vec<(&str, usize)> = vec![];

        for result in results {
            for pair in &result.mathematical_analysis.failed_pairs {
                for platform in platforms_in_pair(pair) {
                    *platform_issues.entry(platform.to_string()).or_default() += 1;
                }
            }
            for issue in &result.inconsistencies {
                match issue_frequency.iter_mut().find(|(i, _)| *i == issue.as_str()) {
                    Some((_, count)) => *count += 1,
                    None => issue_frequency.push((issue.as_str(), 1)),
                }
            }
        }

        issue_frequency.sort_by(|a, b| b.1.cmp(&a.1));
        let common_issues = issue_frequency
            .into_iter()
            .take(COMMON_ISSUE_LIMIT)
            .map(|(issue, _)| issue.to_string())
            .collect();

        let report = SummaryReport {
            total_tokens,
            consistent_tokens,
            inconsistent_tokens: total_tokens - consistent_tokens,
            average_consistency_score,
            common_issues,
            platform_issues,
        };

        info!(
            total = report.total_tokens,
            consistent = report.consistent_tokens,
            inconsistent = report.inconsistent_tokens,
            average_score = report.average_consistency_score,
            "consistency summary"
        );

        report
    }

    fn convert_to_platform_values(
        &self,
        token: &PrimitiveToken,
        providers: &ProviderMap,
    ) -> PlatformValues {
        providers
            .iter()
            .map(|(platform, provider)| {
                let value = provider.convert_token(token).unwrap_or_else(|e| {
                    warn!(token = %token.name, platform = %platform, error = %e, "conversion failed");
                    PlatformValue::conversion_error(token.base_value.clone(), e.to_string())
                });
                (platform.clone(), value)
            })
            .collect()
    }

    fn analyze_consistency(
        &self,
        values: &PlatformValues,
        tolerance: &ToleranceResult,
    ) -> MathematicalAnalysis {
        let entries: Vec<(&String, &PlatformValue)> = values.iter().collect();
        let mut proportional_relationships = BTreeMap::new();
        let mut failed_pairs = vec![];
        let mut max_deviation: f64 = 0.0;
        let mut total = 0usize;
        let mut successes = 0usize;

        for (i, (p1, v1)) in entries.iter().enumerate() {
            for (p2, v2) in &entries[i + 1..] {
                total += 1;

                if v1.is_error() || v2.is_error() {
                    failed_pairs.push(format!("{}-{} (conversion error)", p1, p2));
                    continue;
                }

                let key = format!("{}-{}", p1, p2);
                match (&v1.value, &v2.value) {
                    (TokenValue::Number(a), TokenValue::Number(b)) => {
                        let ratio = if *b != 0.0 {
                            a / b
                        } else if *a == 0.0 {
                            1.0
                        } else {
                            f64::INFINITY
                        };
                        proportional_relationships.insert(key.clone(), ratio);

                        if self.calculator.is_within_numeric_tolerance(*a, *b, tolerance) {
                            successes += 1;
                        } else {
                            let deviation = (a - b).abs();
                            max_deviation = max_deviation.max(deviation);
                            failed_pairs.push(format!(
                                "{} (deviation: {:.4}, tolerance: {:.4})",
                                key, deviation, tolerance.tolerance
                            ));
                        }
                    }
                    (a, b) => {
                        if a == b {
                            proportional_relationships.insert(key, 1.0);
                            successes += 1;
                        } else {
                            proportional_relationships.insert(key.clone(), 0.0);
                            failed_pairs.push(format!(
                                "{} (string mismatch: \"{}\" ≠ \"{}\")",
                                key, a, b
                            ));
                        }
                    }
                }
            }
        }

        let consistency_score = if total > 0 {
            successes as f64 / total as f64
        } else {
            1.0
        };

        MathematicalAnalysis {
            proportional_relationships,
            max_deviation,
            failed_pairs,
            consistency_score,
        }
    }
}

impl Default for CrossPlatformValidator {
    fn default() -> Self {
        Self::new(ToleranceCalculator::default(), PlatformConstraintHandler::default())
    }
}

/// Strict mode discards pairwise analysis for every severity, low included.
fn strict_mode_failure(
    token: &PrimitiveToken,
    platform_values: PlatformValues,
    tolerance: ToleranceResult,
    handled: ConstraintHandlingResult,
) -> DetailedConsistencyResult {
    DetailedConsistencyResult {
        token_name: token.name.clone(),
        category: token.category,
        platforms: platform_values.keys().cloned().collect(),
        is_consistent: false,
        tolerance_level: tolerance.tolerance,
        inconsistencies: vec![STRICT_MODE_INCONSISTENCY.to_string()],
        relationship_validation: STRICT_MODE_INCONSISTENCY.to_string(),
        platform_values,
        tolerance_details: tolerance,
        constraint_handling: Some(handled),
        mathematical_analysis: MathematicalAnalysis {
            proportional_relationships: BTreeMap::new(),
            max_deviation: f64::INFINITY,
            failed_pairs: vec![],
            consistency_score: 0.0,
        },
        recommendations: vec!["Review token configuration and platform requirements".to_string()],
    }
}

fn describe_relationships(analysis: &MathematicalAnalysis) -> String {
    let mut parts = vec![format!(
        "Consistency score: {:.1}%",
        analysis.consistency_score * 100.0
    )];

    if analysis.max_deviation > 0.0 {
        parts.push(format!("Maximum deviation: {:.4}", analysis.max_deviation));
    }

    if analysis.failed_pairs.is_empty() {
        parts.push("All platform pairs maintain mathematical consistency".to_string());
    } else {
        parts.push(format!(
            "{} platform pairs failed consistency checks",
            analysis.failed_pairs.len()
        ));
    }

    let ratios = &analysis.proportional_relationships;
    if !ratios.is_empty() {
        let finite_sum: f64 = ratios.values().filter(|r| r.is_finite()).sum();
        parts.push(format!(
            "Average proportional ratio: {:.3}",
            finite_sum / ratios.len() as f64
        ));
    }

    parts.join("; ")
}

fn generate_recommendations(
    token: &PrimitiveToken,
    analysis: &MathematicalAnalysis,
    constraints: Option<&ConstraintHandlingResult>,
) -> Vec<String> {
    let mut recommendations = vec![];

    if analysis.consistency_score < MIN_CONSISTENCY_SCORE {
        recommendations.push(
            "Consider adjusting base value to improve cross-platform mathematical consistency"
                .to_string(),
        );
    }

    if !analysis.failed_pairs.is_empty() {
        let mut implicated: Vec<&str> = vec![];
        for platform in analysis.failed_pairs.iter().flat_map(|p| platforms_in_pair(p)) {
            if !implicated.contains(&platform) {
                implicated.push(platform);
            }
        }
        recommendations.push(format!(
            "Review unit conversion for platforms: {}",
            implicated.join(", ")
        ));
    }

    if let Some(handled) = constraints.filter(|h| h.has_constraints) {
        if handled
            .constraints
            .iter()
            .any(|c| c.severity == ConstraintSeverity::High)
        {
            recommendations.push(
                "High-severity platform constraints detected - consider design system adjustments"
                    .to_string(),
            );
        }
        recommendations.extend(
            handled
                .constraints
                .iter()
                .filter(|c| !c.recommendation.is_empty())
                .map(|c| c.recommendation.clone()),
        );
    }

    match token.category {
        TokenCategory::FontSize if analysis.max_deviation > 0.1 => {
            recommendations
                .push("Consider using font sizes that convert cleanly to REM values".to_string());
        }
        TokenCategory::TapArea => {
            recommendations.push(
                "Ensure tap areas meet platform accessibility requirements (44pt iOS, 48dp Android)"
                    .to_string(),
            );
        }
        TokenCategory::Spacing | TokenCategory::Radius
            if !token.baseline_grid_alignment && !token.strategic_flexibility =>
        {
            recommendations
                .push("Consider aligning with 8-unit baseline grid for better consistency".to_string());
        }
        _ => {}
    }

    recommendations
}
