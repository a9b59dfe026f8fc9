//! Full pipeline coverage: a CSV transaction dataset parsed into records
//! and priced by the evaluation engine, including exclusions, adjustments,
//! custom rules, and the credit split.

use chrono::{NaiveDate, Utc};

use incentive_ai::dataset;
use incentive_ai::evaluation::EvaluationEngine;
use incentive_ai::scheme::{
    Adjustment, AdjustmentKind, CommissionStructure, ComparisonOperator, CreditLevel,
    CreditRules, CustomRule, Exclusion, FieldValue, ImpactType, IncentiveScheme,
    MeasurementRules, PlanMetadata, PrimaryMetric, RuleCondition, SchemeDocId, SchemeStatus,
    Tier, validate_scheme,
};

const DATASET: &str = "\
orderId,netAmount,region,discount,newLogo
SO-1001,1500,EMEA,5,N
SO-1002,400,EMEA,0,N
SO-1003,2000,APAC,0,N
SO-1004,3000,EMEA,15,Y
";

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn commission_scheme() -> IncentiveScheme {
    IncentiveScheme {
        doc_id: SchemeDocId("emea-software-v1".to_string()),
        scheme_id: "emea-software".to_string(),
        name: "EMEA Software Commission".to_string(),
        description: None,
        effective_start: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
        effective_end: NaiveDate::from_ymd_opt(2025, 12, 31).expect("valid date"),
        currency: "EUR".to_string(),
        revenue_base: "salesOrders".to_string(),
        base_field: Some("netAmount".to_string()),
        participants: vec!["AE-EMEA-1".to_string()],
        sales_quota: 250_000.0,
        commission_structure: CommissionStructure {
            tiers: vec![
                Tier {
                    from: 0.0,
                    to: 1000.0,
                    rate: 5.0,
                },
                Tier {
                    from: 1000.0,
                    to: 1_000_000.0,
                    rate: 10.0,
                },
            ],
        },
        measurement_rules: MeasurementRules {
            primary_metrics: vec![PrimaryMetric {
                field: "netAmount".to_string(),
                operator: ComparisonOperator::GreaterThan,
                value: FieldValue::Number(0.0),
                description: "Positive net revenue".to_string(),
            }],
            min_qualification: 1000.0,
            adjustments: vec![Adjustment {
                id: "adj-000001".to_string(),
                description: "Deep discount haircut".to_string(),
                field: "discount".to_string(),
                operator: ComparisonOperator::GreaterOrEqual,
                value: FieldValue::Number(10.0),
                factor: 0.9,
                kind: AdjustmentKind::PercentageBoost,
                impact: None,
            }],
            exclusions: vec![Exclusion {
                field: "region".to_string(),
                operator: ComparisonOperator::Equal,
                value: FieldValue::Text("APAC".to_string()),
                description: "APAC handled by a separate scheme".to_string(),
            }],
        },
        credit_rules: CreditRules {
            levels: vec![
                CreditLevel {
                    role: "Primary".to_string(),
                    percentage: 80.0,
                    description: None,
                },
                CreditLevel {
                    role: "Overlay".to_string(),
                    percentage: 20.0,
                    description: None,
                },
            ],
        },
        custom_rules: vec![CustomRule {
            name: "New logo kicker".to_string(),
            description: "Flat bonus on new-logo EMEA deals".to_string(),
            conditions: vec![
                RuleCondition {
                    field: "newLogo".to_string(),
                    operator: ComparisonOperator::Equal,
                    value: FieldValue::Text("Y".to_string()),
                },
                RuleCondition {
                    field: "region".to_string(),
                    operator: ComparisonOperator::Equal,
                    value: FieldValue::Text("EMEA".to_string()),
                },
            ],
            impact_type: ImpactType::Monetary,
            impact_value: 50.0,
            active: true,
        }],
        metadata: PlanMetadata::initial(Utc::now(), SchemeStatus::Draft),
    }
}

#[test]
fn csv_dataset_prices_through_every_pass() {
    let scheme = commission_scheme();
    validate_scheme(&scheme, None).expect("scheme is well-formed");

    let records = dataset::parse_records(DATASET.as_bytes()).expect("dataset parses");
    assert_eq!(records.len(), 4);

    let engine = EvaluationEngine::new(scheme);
    let summary = engine.evaluate_all(&records);

    // SO-1001 pays the plain tier amount, SO-1002 misses the threshold,
    // SO-1003 is excluded, SO-1004 is discounted then earns the kicker.
    assert_eq!(summary.records, 4);
    assert_eq!(summary.paid, 2);
    assert_eq!(summary.not_qualified, 1);
    assert_eq!(summary.excluded, 1);

    // SO-1001: 50 + 500 * 0.10 = 100.
    // SO-1004: (50 + 2000 * 0.10) * 0.9 + 50 = 275.
    approx(summary.total_payout, 375.0);
}

#[test]
fn credit_split_covers_the_whole_payout() {
    let engine = EvaluationEngine::new(commission_scheme());
    let records = dataset::parse_records(DATASET.as_bytes()).expect("dataset parses");
    let summary = engine.evaluate_all(&records);

    let shares = engine.credit_split(summary.total_payout);
    assert_eq!(shares.len(), 2);
    approx(shares[0].amount, 300.0);
    approx(shares[1].amount, 75.0);
    approx(
        shares.iter().map(|share| share.amount).sum::<f64>(),
        summary.total_payout,
    );
}

#[test]
fn numeric_looking_csv_cells_compare_numerically() {
    let scheme = commission_scheme();
    let records =
        dataset::parse_records("netAmount,discount,region,newLogo\n01500,00,EMEA,N\n".as_bytes())
            .expect("dataset parses");

    let engine = EvaluationEngine::new(scheme);
    let summary = engine.evaluate_all(&records);
    assert_eq!(summary.paid, 1);
    approx(summary.total_payout, 100.0);
}
