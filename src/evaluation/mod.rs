//! Payout evaluation: the pure, synchronous core that applies one scheme
//! document to a transaction dataset.
//!
//! Per record the passes run in a fixed order: exclusions drop the record
//! outright, qualification gates it, the tier ladder prices the measure,
//! then adjustments and custom rules modify the payout in authored order.

mod operators;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{KpiCatalog, KpiDataType};
use crate::scheme::{
    AdjustmentKind, ComparisonOperator, FieldValue, ImpactType, IncentiveScheme,
};

use operators::operand_matches;

/// One row of the transaction dataset, keyed by source field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub fields: BTreeMap<String, FieldValue>,
}

impl TransactionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(field.into(), value.into());
        self
    }
}

impl FromIterator<(String, FieldValue)> for TransactionRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Which pass produced a payout component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayoutStage {
    TierBase,
    Adjustment,
    CustomRule,
}

/// Discrete contribution to a record's payout, for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutComponent {
    pub stage: PayoutStage,
    pub detail: String,
    /// Signed delta this component applied to the running payout.
    pub amount: f64,
}

/// Priced outcome for one qualifying record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayout {
    pub measure: f64,
    pub payout: f64,
    pub components: Vec<PayoutComponent>,
}

/// Outcome of evaluating one record against the scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordOutcome {
    /// Dropped by an exclusion before qualification or pricing.
    Excluded { reason: String },
    /// Survived exclusions but failed qualification.
    NotQualified,
    Paid(RecordPayout),
}

/// Aggregate view over one dataset pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutSummary {
    pub records: usize,
    pub excluded: usize,
    pub not_qualified: usize,
    pub paid: usize,
    pub total_payout: f64,
}

/// One participant role's slice of a payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditShare {
    pub role: String,
    pub percentage: f64,
    pub amount: f64,
}

/// Stateless evaluator binding one scheme document to the operator
/// semantics of its KPI catalog.
pub struct EvaluationEngine {
    scheme: IncentiveScheme,
    data_types: BTreeMap<String, KpiDataType>,
}

impl EvaluationEngine {
    /// Build an engine without catalog metadata: equality falls back to
    /// coercion-based semantics.
    pub fn new(scheme: IncentiveScheme) -> Self {
        Self {
            scheme,
            data_types: BTreeMap::new(),
        }
    }

    /// Build an engine that resolves declared data types for every field
    /// the scheme references.
    pub fn with_catalog(scheme: IncentiveScheme, catalog: &dyn KpiCatalog) -> Self {
        let mut data_types = BTreeMap::new();
        let mut resolve = |field: &str| {
            if !field.is_empty() && !data_types.contains_key(field) {
                if let Some(mapping) = catalog.find(field) {
                    data_types.insert(field.to_string(), mapping.data_type);
                }
            }
        };

        resolve(scheme.measure_field());
        for metric in &scheme.measurement_rules.primary_metrics {
            resolve(&metric.field);
        }
        for adjustment in &scheme.measurement_rules.adjustments {
            resolve(&adjustment.field);
        }
        for exclusion in &scheme.measurement_rules.exclusions {
            resolve(&exclusion.field);
        }
        for rule in &scheme.custom_rules {
            for condition in &rule.conditions {
                resolve(&condition.field);
            }
        }

        Self { scheme, data_types }
    }

    pub fn scheme(&self) -> &IncentiveScheme {
        &self.scheme
    }

    fn matches(
        &self,
        record: &TransactionRecord,
        field: &str,
        operator: ComparisonOperator,
        value: &FieldValue,
    ) -> bool {
        operand_matches(
            record.get(field),
            operator,
            value,
            self.data_types.get(field).copied(),
        )
    }

    /// The exclusion matching this record, if any. Exclusions OR
    /// together and run before everything else.
    fn matching_exclusion(&self, record: &TransactionRecord) -> Option<&crate::scheme::Exclusion> {
        self.scheme
            .measurement_rules
            .exclusions
            .iter()
            .find(|exclusion| {
                self.matches(record, &exclusion.field, exclusion.operator, &exclusion.value)
            })
    }

    /// Qualification: every primary metric holds and the base measure
    /// clears the minimum threshold.
    fn qualifies(&self, record: &TransactionRecord, measure: f64) -> bool {
        let rules = &self.scheme.measurement_rules;
        rules
            .primary_metrics
            .iter()
            .all(|metric| self.matches(record, &metric.field, metric.operator, &metric.value))
            && measure >= rules.min_qualification
    }

    fn base_measure(&self, record: &TransactionRecord) -> f64 {
        record
            .get(self.scheme.measure_field())
            .and_then(FieldValue::as_number)
            .unwrap_or(0.0)
    }

    /// Evaluate a single record through every pass.
    pub fn evaluate(&self, record: &TransactionRecord) -> RecordOutcome {
        if let Some(exclusion) = self.matching_exclusion(record) {
            return RecordOutcome::Excluded {
                reason: exclusion.description.clone(),
            };
        }

        let measure = self.base_measure(record);
        if !self.qualifies(record, measure) {
            return RecordOutcome::NotQualified;
        }

        let mut components = Vec::new();
        let mut payout = self.scheme.commission_structure.payout_for(measure);
        components.push(PayoutComponent {
            stage: PayoutStage::TierBase,
            detail: format!("tier payout on measure {measure}"),
            amount: payout,
        });

        for adjustment in &self.scheme.measurement_rules.adjustments {
            if !self.matches(record, &adjustment.field, adjustment.operator, &adjustment.value) {
                continue;
            }
            let before = payout;
            match adjustment.kind {
                AdjustmentKind::PercentageBoost => payout *= adjustment.factor,
                AdjustmentKind::MonetaryAmount => payout += adjustment.impact.unwrap_or(0.0),
            }
            components.push(PayoutComponent {
                stage: PayoutStage::Adjustment,
                detail: adjustment.description.clone(),
                amount: payout - before,
            });
        }

        for rule in &self.scheme.custom_rules {
            if !rule.active || rule.conditions.is_empty() {
                continue;
            }
            let fired = rule
                .conditions
                .iter()
                .all(|condition| {
                    self.matches(record, &condition.field, condition.operator, &condition.value)
                });
            if !fired {
                continue;
            }
            let before = payout;
            match rule.impact_type {
                ImpactType::Percentage => payout *= 1.0 + rule.impact_value / 100.0,
                ImpactType::Monetary => payout += rule.impact_value,
            }
            components.push(PayoutComponent {
                stage: PayoutStage::CustomRule,
                detail: rule.name.clone(),
                amount: payout - before,
            });
        }

        RecordOutcome::Paid(RecordPayout {
            measure,
            payout,
            components,
        })
    }

    /// One pass over a finite dataset, folding per-record outcomes into a
    /// summary.
    pub fn evaluate_all<'a, I>(&self, records: I) -> PayoutSummary
    where
        I: IntoIterator<Item = &'a TransactionRecord>,
    {
        let mut summary = PayoutSummary {
            records: 0,
            excluded: 0,
            not_qualified: 0,
            paid: 0,
            total_payout: 0.0,
        };
        for record in records {
            summary.records += 1;
            match self.evaluate(record) {
                RecordOutcome::Excluded { .. } => summary.excluded += 1,
                RecordOutcome::NotQualified => summary.not_qualified += 1,
                RecordOutcome::Paid(payout) => {
                    summary.paid += 1;
                    summary.total_payout += payout.payout;
                }
            }
        }
        summary
    }

    /// Split a payout across the scheme's credit levels.
    pub fn credit_split(&self, payout: f64) -> Vec<CreditShare> {
        self.scheme
            .credit_rules
            .levels
            .iter()
            .map(|level| CreditShare {
                role: level.role.clone(),
                percentage: level.percentage,
                amount: payout * level.percentage / 100.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::test_support::sample_scheme;
    use crate::scheme::{
        Adjustment, CustomRule, Exclusion, RuleCondition,
    };

    fn record(pairs: &[(&str, FieldValue)]) -> TransactionRecord {
        pairs
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn boost(id: &str, factor: f64) -> Adjustment {
        Adjustment {
            id: id.to_string(),
            description: format!("{factor}x boost"),
            field: "discount".to_string(),
            operator: ComparisonOperator::GreaterThan,
            value: FieldValue::Number(10.0),
            factor,
            kind: AdjustmentKind::PercentageBoost,
            impact: None,
        }
    }

    #[test]
    fn excluded_records_never_reach_pricing() {
        let mut scheme = sample_scheme("scheme-excl");
        scheme.measurement_rules.exclusions.push(Exclusion {
            field: "region".to_string(),
            operator: ComparisonOperator::Equal,
            value: FieldValue::Text("APAC".to_string()),
            description: "APAC handled by a separate scheme".to_string(),
        });
        let engine = EvaluationEngine::new(scheme);

        // Satisfies every primary metric, yet the exclusion wins.
        let outcome = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("region", FieldValue::Text("APAC".to_string())),
        ]));
        assert_eq!(
            outcome,
            RecordOutcome::Excluded {
                reason: "APAC handled by a separate scheme".to_string()
            }
        );
    }

    #[test]
    fn qualification_requires_all_metrics_and_the_threshold() {
        let mut scheme = sample_scheme("scheme-qual");
        scheme.measurement_rules.min_qualification = 1000.0;
        let engine = EvaluationEngine::new(scheme);

        assert_eq!(
            engine.evaluate(&record(&[("netAmount", FieldValue::Number(800.0))])),
            RecordOutcome::NotQualified
        );
        assert!(matches!(
            engine.evaluate(&record(&[("netAmount", FieldValue::Number(1500.0))])),
            RecordOutcome::Paid(_)
        ));
        // Metric field missing entirely: fails closed.
        assert_eq!(
            engine.evaluate(&record(&[("region", FieldValue::Text("EMEA".to_string()))])),
            RecordOutcome::NotQualified
        );
    }

    #[test]
    fn tier_payout_matches_the_progressive_contract() {
        let engine = EvaluationEngine::new(sample_scheme("scheme-tier"));
        let outcome = engine.evaluate(&record(&[("netAmount", FieldValue::Number(1500.0))]));
        let RecordOutcome::Paid(paid) = outcome else {
            panic!("expected a paid outcome, got {outcome:?}");
        };
        approx(paid.payout, 100.0);
        assert_eq!(paid.components[0].stage, PayoutStage::TierBase);
    }

    #[test]
    fn adjustments_compound_in_authored_order() {
        let mut scheme = sample_scheme("scheme-adj");
        scheme.measurement_rules.adjustments = vec![boost("adj-1", 1.1), boost("adj-2", 1.2)];
        let engine = EvaluationEngine::new(scheme);

        let outcome = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("discount", FieldValue::Number(15.0)),
        ]));
        let RecordOutcome::Paid(paid) = outcome else {
            panic!("expected a paid outcome, got {outcome:?}");
        };
        // 100 * 1.1 * 1.2 = 132
        approx(paid.payout, 132.0);
        assert_eq!(paid.components.len(), 3);
    }

    #[test]
    fn monetary_adjustments_add_their_impact() {
        let mut scheme = sample_scheme("scheme-adj-monetary");
        scheme.measurement_rules.adjustments = vec![Adjustment {
            id: "adj-flat".to_string(),
            description: "flat kicker".to_string(),
            field: "newLogo".to_string(),
            operator: ComparisonOperator::Equal,
            value: FieldValue::Text("Y".to_string()),
            factor: 1.0,
            kind: AdjustmentKind::MonetaryAmount,
            impact: Some(25.0),
        }];
        let engine = EvaluationEngine::new(scheme);

        let outcome = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("newLogo", FieldValue::Text("Y".to_string())),
        ]));
        let RecordOutcome::Paid(paid) = outcome else {
            panic!("expected a paid outcome, got {outcome:?}");
        };
        approx(paid.payout, 125.0);
    }

    #[test]
    fn custom_rules_fire_only_when_every_condition_holds() {
        let mut scheme = sample_scheme("scheme-custom");
        scheme.custom_rules.push(CustomRule {
            name: "EMEA bundle bonus".to_string(),
            description: "Bonus for bundled EMEA deals".to_string(),
            conditions: vec![
                RuleCondition {
                    field: "region".to_string(),
                    operator: ComparisonOperator::Equal,
                    value: FieldValue::Text("EMEA".to_string()),
                },
                RuleCondition {
                    field: "bundled".to_string(),
                    operator: ComparisonOperator::Equal,
                    value: FieldValue::Text("Y".to_string()),
                },
            ],
            impact_type: ImpactType::Monetary,
            impact_value: 40.0,
            active: true,
        });
        let engine = EvaluationEngine::new(scheme);

        let both = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("region", FieldValue::Text("EMEA".to_string())),
            ("bundled", FieldValue::Text("Y".to_string())),
        ]));
        let RecordOutcome::Paid(paid) = both else {
            panic!("expected a paid outcome, got {both:?}");
        };
        approx(paid.payout, 140.0);

        let one = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("region", FieldValue::Text("EMEA".to_string())),
            ("bundled", FieldValue::Text("N".to_string())),
        ]));
        let RecordOutcome::Paid(paid) = one else {
            panic!("expected a paid outcome, got {one:?}");
        };
        approx(paid.payout, 100.0);
    }

    #[test]
    fn percentage_custom_rules_scale_the_running_payout() {
        let mut scheme = sample_scheme("scheme-custom-pct");
        scheme.custom_rules.push(CustomRule {
            name: "Strategic uplift".to_string(),
            description: String::new(),
            conditions: vec![RuleCondition {
                field: "strategic".to_string(),
                operator: ComparisonOperator::Equal,
                value: FieldValue::Text("Y".to_string()),
            }],
            impact_type: ImpactType::Percentage,
            impact_value: 10.0,
            active: true,
        });
        let engine = EvaluationEngine::new(scheme);

        let outcome = engine.evaluate(&record(&[
            ("netAmount", FieldValue::Number(1500.0)),
            ("strategic", FieldValue::Text("Y".to_string())),
        ]));
        let RecordOutcome::Paid(paid) = outcome else {
            panic!("expected a paid outcome, got {outcome:?}");
        };
        approx(paid.payout, 110.0);
    }

    #[test]
    fn inactive_and_condition_less_rules_never_fire() {
        let mut scheme = sample_scheme("scheme-custom-inert");
        scheme.custom_rules.push(CustomRule {
            name: "Inactive".to_string(),
            description: String::new(),
            conditions: vec![RuleCondition {
                field: "netAmount".to_string(),
                operator: ComparisonOperator::GreaterThan,
                value: FieldValue::Number(0.0),
            }],
            impact_type: ImpactType::Monetary,
            impact_value: 1000.0,
            active: false,
        });
        scheme.custom_rules.push(CustomRule {
            name: "Vacuous".to_string(),
            description: String::new(),
            conditions: Vec::new(),
            impact_type: ImpactType::Monetary,
            impact_value: 1000.0,
            active: true,
        });
        let engine = EvaluationEngine::new(scheme);

        let outcome = engine.evaluate(&record(&[("netAmount", FieldValue::Number(1500.0))]));
        let RecordOutcome::Paid(paid) = outcome else {
            panic!("expected a paid outcome, got {outcome:?}");
        };
        approx(paid.payout, 100.0);
    }

    #[test]
    fn evaluate_all_folds_counts_and_totals() {
        let mut scheme = sample_scheme("scheme-summary");
        scheme.measurement_rules.min_qualification = 1000.0;
        scheme.measurement_rules.exclusions.push(Exclusion {
            field: "region".to_string(),
            operator: ComparisonOperator::Equal,
            value: FieldValue::Text("APAC".to_string()),
            description: "out of territory".to_string(),
        });
        let engine = EvaluationEngine::new(scheme);

        let records = vec![
            record(&[("netAmount", FieldValue::Number(1500.0))]),
            record(&[("netAmount", FieldValue::Number(400.0))]),
            record(&[
                ("netAmount", FieldValue::Number(2000.0)),
                ("region", FieldValue::Text("APAC".to_string())),
            ]),
        ];
        let summary = engine.evaluate_all(&records);
        assert_eq!(summary.records, 3);
        assert_eq!(summary.paid, 1);
        assert_eq!(summary.not_qualified, 1);
        assert_eq!(summary.excluded, 1);
        approx(summary.total_payout, 100.0);
    }

    #[test]
    fn credit_split_applies_level_percentages() {
        let engine = EvaluationEngine::new(sample_scheme("scheme-credit"));
        let shares = engine.credit_split(200.0);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].role, "Primary");
        approx(shares[0].amount, 160.0);
        approx(shares[1].amount, 40.0);
    }
}
