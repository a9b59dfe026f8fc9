//! Boundary validation for scheme documents. Everything here runs before
//! any write reaches the repository.

use tracing::warn;

use crate::catalog::KpiCatalog;

use super::domain::{
    CommissionStructure, ComparisonOperator, FieldValue, IncentiveScheme,
};

#[derive(Debug, thiserror::Error)]
pub enum SchemeValidationError {
    #[error("commission structure requires at least one tier")]
    EmptyTierLadder,
    #[error("tier {index} rate {rate} must lie within [0, 100]")]
    RateOutOfRange { index: usize, rate: f64 },
    #[error("tier {index} upper bound {to} must exceed its lower bound {from}")]
    EmptyTierSpan { index: usize, from: f64, to: f64 },
    #[error("the first tier must start at 0, found {from}")]
    LadderNotAnchored { from: f64 },
    #[error("tier {index} starts at {found} but the previous tier ends at {expected}")]
    LadderGap {
        index: usize,
        expected: f64,
        found: f64,
    },
    #[error("scheme requires at least one participant")]
    NoParticipants,
    #[error("effective window ends ({end}) before it starts ({start})")]
    EffectiveWindowInverted {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    #[error("minimum qualification {value} must not be negative")]
    NegativeMinQualification { value: f64 },
    #[error("credit level '{role}' percentage {percentage} must lie within [0, 100]")]
    CreditPercentageOutOfRange { role: String, percentage: f64 },
    #[error("custom rule name '{name}' is used more than once")]
    DuplicateCustomRuleName { name: String },
    #[error("operator {operator} on field '{field}' requires a numeric value, got '{value}'")]
    NonNumericOperand {
        field: String,
        operator: &'static str,
        value: String,
    },
    #[error("rule field '{field}' does not name any KPI in the catalog")]
    UnknownKpiField { field: String },
}

/// Validate a scheme document. When a catalog is supplied, every rule
/// field must resolve to a registered KPI; without one, field existence
/// is the caller's concern.
pub fn validate_scheme(
    scheme: &IncentiveScheme,
    catalog: Option<&dyn KpiCatalog>,
) -> Result<(), SchemeValidationError> {
    validate_ladder(&scheme.commission_structure)?;

    if scheme.participants.is_empty() {
        return Err(SchemeValidationError::NoParticipants);
    }

    if scheme.effective_end < scheme.effective_start {
        return Err(SchemeValidationError::EffectiveWindowInverted {
            start: scheme.effective_start,
            end: scheme.effective_end,
        });
    }

    let rules = &scheme.measurement_rules;
    if rules.min_qualification < 0.0 {
        return Err(SchemeValidationError::NegativeMinQualification {
            value: rules.min_qualification,
        });
    }

    for metric in &rules.primary_metrics {
        validate_condition(&metric.field, metric.operator, &metric.value, catalog)?;
    }
    for adjustment in &rules.adjustments {
        validate_condition(&adjustment.field, adjustment.operator, &adjustment.value, catalog)?;
    }
    for exclusion in &rules.exclusions {
        validate_condition(&exclusion.field, exclusion.operator, &exclusion.value, catalog)?;
    }

    for level in &scheme.credit_rules.levels {
        if !(0.0..=100.0).contains(&level.percentage) {
            return Err(SchemeValidationError::CreditPercentageOutOfRange {
                role: level.role.clone(),
                percentage: level.percentage,
            });
        }
    }
    let credit_total: f64 = scheme
        .credit_rules
        .levels
        .iter()
        .map(|level| level.percentage)
        .sum();
    if !scheme.credit_rules.levels.is_empty() && (credit_total - 100.0).abs() > 1e-9 {
        // Advisory only: the split is allowed to under- or over-allocate.
        warn!(
            scheme_id = %scheme.scheme_id,
            credit_total,
            "credit level percentages do not sum to 100"
        );
    }

    for (index, rule) in scheme.custom_rules.iter().enumerate() {
        if scheme.custom_rules[..index]
            .iter()
            .any(|earlier| earlier.name == rule.name)
        {
            return Err(SchemeValidationError::DuplicateCustomRuleName {
                name: rule.name.clone(),
            });
        }
        for condition in &rule.conditions {
            validate_condition(&condition.field, condition.operator, &condition.value, catalog)?;
        }
    }

    Ok(())
}

/// Ladder shape checks: non-empty, anchored at 0, contiguous, positive
/// spans, rates within [0, 100].
pub fn validate_ladder(structure: &CommissionStructure) -> Result<(), SchemeValidationError> {
    let first = structure
        .tiers
        .first()
        .ok_or(SchemeValidationError::EmptyTierLadder)?;
    if first.from != 0.0 {
        return Err(SchemeValidationError::LadderNotAnchored { from: first.from });
    }

    for (index, tier) in structure.tiers.iter().enumerate() {
        if !(0.0..=100.0).contains(&tier.rate) {
            return Err(SchemeValidationError::RateOutOfRange {
                index,
                rate: tier.rate,
            });
        }
        if tier.to <= tier.from {
            return Err(SchemeValidationError::EmptyTierSpan {
                index,
                from: tier.from,
                to: tier.to,
            });
        }
        if index > 0 {
            let expected = structure.tiers[index - 1].to;
            if tier.from != expected {
                return Err(SchemeValidationError::LadderGap {
                    index,
                    expected,
                    found: tier.from,
                });
            }
        }
    }

    Ok(())
}

fn validate_condition(
    field: &str,
    operator: ComparisonOperator,
    value: &FieldValue,
    catalog: Option<&dyn KpiCatalog>,
) -> Result<(), SchemeValidationError> {
    if operator.is_numeric() && value.as_number().is_none() {
        return Err(SchemeValidationError::NonNumericOperand {
            field: field.to_string(),
            operator: operator.symbol(),
            value: value.to_string(),
        });
    }
    if let Some(catalog) = catalog {
        if catalog.find(field).is_none() {
            return Err(SchemeValidationError::UnknownKpiField {
                field: field.to_string(),
            });
        }
    }
    Ok(())
}
