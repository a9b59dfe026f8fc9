//! Scheme document model, tier ladder operations, rule-block editing, and
//! boundary validation.

pub mod domain;
pub mod rules;
pub mod tiers;
pub mod validate;

pub use domain::{
    Adjustment, AdjustmentKind, CommissionStructure, ComparisonOperator, CreditLevel,
    CreditRules, CustomRule, Exclusion, FieldValue, ImpactType, IncentiveScheme, InvalidStatus,
    MeasurementRules, PlanMetadata, PrimaryMetric, RuleCondition, SchemeDocId, SchemeStatus, Tier,
};
pub use rules::{
    AdjustmentField, ConditionField, CustomRuleField, ExclusionField, PrimaryMetricField,
    RuleEditError,
};
pub use tiers::{TierError, TierField};
pub use validate::{validate_ladder, validate_scheme, SchemeValidationError};
