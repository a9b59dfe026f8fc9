//! Index-addressed editing of the measurement rule blocks and the custom
//! rule set. Settable fields are closed enums carrying the new value, so
//! every edit path is matched exhaustively.

use std::sync::atomic::{AtomicU64, Ordering};

use super::domain::{
    Adjustment, AdjustmentKind, ComparisonOperator, CustomRule, Exclusion, FieldValue,
    ImpactType, IncentiveScheme, MeasurementRules, PrimaryMetric, RuleCondition,
};

static ADJUSTMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_adjustment_id() -> String {
    let id = ADJUSTMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("adj-{id:06}")
}

#[derive(Debug, thiserror::Error)]
pub enum RuleEditError {
    #[error("index {index} is out of range")]
    IndexOutOfRange { index: usize },
    #[error("condition {condition} of rule {rule} is out of range")]
    ConditionOutOfRange { rule: usize, condition: usize },
    #[error("a custom rule named '{name}' already exists")]
    DuplicateRuleName { name: String },
    #[error("minimum qualification {value} must not be negative")]
    NegativeMinQualification { value: f64 },
}

/// Settable fields of a primary metric.
#[derive(Debug, Clone)]
pub enum PrimaryMetricField {
    Field(String),
    Operator(ComparisonOperator),
    Value(FieldValue),
    Description(String),
}

/// Settable fields of an adjustment.
#[derive(Debug, Clone)]
pub enum AdjustmentField {
    Field(String),
    Operator(ComparisonOperator),
    Value(FieldValue),
    Factor(f64),
    Kind(AdjustmentKind),
    Impact(Option<f64>),
    Description(String),
}

/// Settable fields of an exclusion.
#[derive(Debug, Clone)]
pub enum ExclusionField {
    Field(String),
    Operator(ComparisonOperator),
    Value(FieldValue),
    Description(String),
}

/// Settable fields of a custom rule (conditions are edited separately).
#[derive(Debug, Clone)]
pub enum CustomRuleField {
    Name(String),
    Description(String),
    ImpactType(ImpactType),
    ImpactValue(f64),
    Active(bool),
}

/// Settable fields of one rule condition.
#[derive(Debug, Clone)]
pub enum ConditionField {
    Field(String),
    Operator(ComparisonOperator),
    Value(FieldValue),
}

impl MeasurementRules {
    /// Append a qualifying criterion with designer defaults.
    pub fn add_primary_metric(&mut self, field: impl Into<String>) -> &PrimaryMetric {
        self.primary_metrics.push(PrimaryMetric {
            field: field.into(),
            operator: ComparisonOperator::GreaterThan,
            value: FieldValue::Number(0.0),
            description: "New qualifying criteria".to_string(),
        });
        &self.primary_metrics[self.primary_metrics.len() - 1]
    }

    pub fn update_primary_metric(
        &mut self,
        index: usize,
        change: PrimaryMetricField,
    ) -> Result<(), RuleEditError> {
        let metric = self
            .primary_metrics
            .get_mut(index)
            .ok_or(RuleEditError::IndexOutOfRange { index })?;
        match change {
            PrimaryMetricField::Field(field) => metric.field = field,
            PrimaryMetricField::Operator(operator) => metric.operator = operator,
            PrimaryMetricField::Value(value) => metric.value = value,
            PrimaryMetricField::Description(description) => metric.description = description,
        }
        Ok(())
    }

    pub fn remove_primary_metric(&mut self, index: usize) -> Result<PrimaryMetric, RuleEditError> {
        if index >= self.primary_metrics.len() {
            return Err(RuleEditError::IndexOutOfRange { index });
        }
        Ok(self.primary_metrics.remove(index))
    }

    pub fn set_min_qualification(&mut self, value: f64) -> Result<(), RuleEditError> {
        if value < 0.0 {
            return Err(RuleEditError::NegativeMinQualification { value });
        }
        self.min_qualification = value;
        Ok(())
    }

    /// Append an adjustment with designer defaults and a fresh id.
    pub fn add_adjustment(&mut self, field: impl Into<String>) -> &Adjustment {
        self.adjustments.push(Adjustment {
            id: next_adjustment_id(),
            description: "New adjustment rule".to_string(),
            field: field.into(),
            operator: ComparisonOperator::GreaterThan,
            value: FieldValue::Number(0.0),
            factor: 1.0,
            kind: AdjustmentKind::PercentageBoost,
            impact: None,
        });
        &self.adjustments[self.adjustments.len() - 1]
    }

    pub fn update_adjustment(
        &mut self,
        index: usize,
        change: AdjustmentField,
    ) -> Result<(), RuleEditError> {
        let adjustment = self
            .adjustments
            .get_mut(index)
            .ok_or(RuleEditError::IndexOutOfRange { index })?;
        match change {
            AdjustmentField::Field(field) => adjustment.field = field,
            AdjustmentField::Operator(operator) => adjustment.operator = operator,
            AdjustmentField::Value(value) => adjustment.value = value,
            AdjustmentField::Factor(factor) => adjustment.factor = factor,
            AdjustmentField::Kind(kind) => adjustment.kind = kind,
            AdjustmentField::Impact(impact) => adjustment.impact = impact,
            AdjustmentField::Description(description) => adjustment.description = description,
        }
        Ok(())
    }

    pub fn remove_adjustment(&mut self, index: usize) -> Result<Adjustment, RuleEditError> {
        if index >= self.adjustments.len() {
            return Err(RuleEditError::IndexOutOfRange { index });
        }
        Ok(self.adjustments.remove(index))
    }

    /// Append an exclusion with designer defaults.
    pub fn add_exclusion(&mut self, field: impl Into<String>) -> &Exclusion {
        self.exclusions.push(Exclusion {
            field: field.into(),
            operator: ComparisonOperator::GreaterThan,
            value: FieldValue::Number(0.0),
            description: "New exclusion rule".to_string(),
        });
        &self.exclusions[self.exclusions.len() - 1]
    }

    pub fn update_exclusion(
        &mut self,
        index: usize,
        change: ExclusionField,
    ) -> Result<(), RuleEditError> {
        let exclusion = self
            .exclusions
            .get_mut(index)
            .ok_or(RuleEditError::IndexOutOfRange { index })?;
        match change {
            ExclusionField::Field(field) => exclusion.field = field,
            ExclusionField::Operator(operator) => exclusion.operator = operator,
            ExclusionField::Value(value) => exclusion.value = value,
            ExclusionField::Description(description) => exclusion.description = description,
        }
        Ok(())
    }

    pub fn remove_exclusion(&mut self, index: usize) -> Result<Exclusion, RuleEditError> {
        if index >= self.exclusions.len() {
            return Err(RuleEditError::IndexOutOfRange { index });
        }
        Ok(self.exclusions.remove(index))
    }
}

impl IncentiveScheme {
    /// Append a named, inactive-by-default custom rule. Names are unique
    /// within a scheme.
    pub fn add_custom_rule(&mut self, name: impl Into<String>) -> Result<&CustomRule, RuleEditError> {
        let name = name.into();
        if self.custom_rules.iter().any(|rule| rule.name == name) {
            return Err(RuleEditError::DuplicateRuleName { name });
        }
        self.custom_rules.push(CustomRule {
            name,
            description: String::new(),
            conditions: Vec::new(),
            impact_type: ImpactType::Percentage,
            impact_value: 0.0,
            active: false,
        });
        Ok(&self.custom_rules[self.custom_rules.len() - 1])
    }

    pub fn update_custom_rule(
        &mut self,
        index: usize,
        change: CustomRuleField,
    ) -> Result<(), RuleEditError> {
        if let CustomRuleField::Name(ref name) = change {
            if self
                .custom_rules
                .iter()
                .enumerate()
                .any(|(i, rule)| i != index && rule.name == *name)
            {
                return Err(RuleEditError::DuplicateRuleName { name: name.clone() });
            }
        }
        let rule = self
            .custom_rules
            .get_mut(index)
            .ok_or(RuleEditError::IndexOutOfRange { index })?;
        match change {
            CustomRuleField::Name(name) => rule.name = name,
            CustomRuleField::Description(description) => rule.description = description,
            CustomRuleField::ImpactType(impact_type) => rule.impact_type = impact_type,
            CustomRuleField::ImpactValue(impact_value) => rule.impact_value = impact_value,
            CustomRuleField::Active(active) => rule.active = active,
        }
        Ok(())
    }

    pub fn remove_custom_rule(&mut self, index: usize) -> Result<CustomRule, RuleEditError> {
        if index >= self.custom_rules.len() {
            return Err(RuleEditError::IndexOutOfRange { index });
        }
        Ok(self.custom_rules.remove(index))
    }

    /// Append a default condition to the rule at `rule_index`.
    pub fn add_rule_condition(&mut self, rule_index: usize) -> Result<(), RuleEditError> {
        let rule = self
            .custom_rules
            .get_mut(rule_index)
            .ok_or(RuleEditError::IndexOutOfRange { index: rule_index })?;
        rule.conditions.push(RuleCondition {
            field: String::new(),
            operator: ComparisonOperator::GreaterThan,
            value: FieldValue::Number(0.0),
        });
        Ok(())
    }

    pub fn update_rule_condition(
        &mut self,
        rule_index: usize,
        condition_index: usize,
        change: ConditionField,
    ) -> Result<(), RuleEditError> {
        let rule = self
            .custom_rules
            .get_mut(rule_index)
            .ok_or(RuleEditError::IndexOutOfRange { index: rule_index })?;
        let condition =
            rule.conditions
                .get_mut(condition_index)
                .ok_or(RuleEditError::ConditionOutOfRange {
                    rule: rule_index,
                    condition: condition_index,
                })?;
        match change {
            ConditionField::Field(field) => condition.field = field,
            ConditionField::Operator(operator) => condition.operator = operator,
            ConditionField::Value(value) => condition.value = value,
        }
        Ok(())
    }

    pub fn remove_rule_condition(
        &mut self,
        rule_index: usize,
        condition_index: usize,
    ) -> Result<RuleCondition, RuleEditError> {
        let rule = self
            .custom_rules
            .get_mut(rule_index)
            .ok_or(RuleEditError::IndexOutOfRange { index: rule_index })?;
        if condition_index >= rule.conditions.len() {
            return Err(RuleEditError::ConditionOutOfRange {
                rule: rule_index,
                condition: condition_index,
            });
        }
        Ok(rule.conditions.remove(condition_index))
    }
}
