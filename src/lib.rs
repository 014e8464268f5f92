//! TokenParity Core - Cross-Platform Design Token Consistency Engine
//!
//! # Guarantees
//! 1. Every platform pair is compared; nothing is sampled
//! 2. Tolerance is budgeted, never guessed
//! 3. Platform constraints are corrections, not tolerance
//! 4. A failing provider poisons its own pairs only
//! 5. Identical inputs produce identical results and fingerprints

pub mod tokens;
pub mod providers;
pub mod tolerance;
pub mod constraints;
pub mod validation;
pub mod hashing;
pub mod config;
pub mod error;

pub use tokens::{PlatformValue, PlatformValues, PrimitiveToken, TokenCategory, TokenSet, TokenValue};
pub use providers::{
    reference_providers, AndroidDensity, AndroidUnitConverter, ConversionError, IosUnitConverter,
    ProviderMap, UnitProvider, WebUnitConverter,
};
pub use tolerance::{ToleranceCalculator, ToleranceConfig, ToleranceContext, ToleranceError, ToleranceResult};
pub use constraints::{
    ConstraintHandlingResult, ConstraintRule, ConstraintSeverity, PlatformConstraint,
    PlatformConstraintHandler, RuleInput,
};
pub use validation::{
    CrossPlatformValidator, DetailedConsistencyResult, MathematicalAnalysis, SummaryReport,
    ValidationContext, ValidationOptions,
};
pub use hashing::{canonical_json, compute_results_fingerprint, sha256_hex};
pub use config::EngineConfig;
pub use error::{Error, Result};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
