use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of one stored scheme document (one version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemeDocId(pub String);

impl fmt::Display for SchemeDocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One commission band: the `[from, to)` slice of the measure taxed at
/// `rate` percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub from: f64,
    pub to: f64,
    pub rate: f64,
}

/// Ordered, contiguous tier ladder anchored at `from = 0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommissionStructure {
    pub tiers: Vec<Tier>,
}

/// Comparison operators permitted in rule conditions. Wire strings match
/// the authored scheme documents exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
}

impl ComparisonOperator {
    /// The four ordering operators require numeric operands.
    pub const fn is_numeric(self) -> bool {
        !matches!(self, ComparisonOperator::Equal | ComparisonOperator::NotEqual)
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessOrEqual => "<=",
            ComparisonOperator::Equal => "==",
            ComparisonOperator::NotEqual => "!=",
        }
    }
}

/// A rule literal or a transaction field value. Documents carry these as
/// plain JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view; text that parses as a number coerces.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Qualifying criterion: the record's `field` must satisfy
/// `operator value` for the record to count at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryMetric {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: FieldValue,
    pub description: String,
}

/// How a matched adjustment acts on the per-record payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentKind {
    #[serde(rename = "PERCENTAGE_BOOST")]
    PercentageBoost,
    #[serde(rename = "MONETARY_AMOUNT")]
    MonetaryAmount,
}

/// Conditional modifier applied after tier computation. `PercentageBoost`
/// scales the payout by `factor`; `MonetaryAmount` adds `impact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: String,
    pub description: String,
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: FieldValue,
    pub factor: f64,
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<f64>,
}

/// Conditional disqualifier: a matching record is dropped from the
/// qualifying base before any commission computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: FieldValue,
    pub description: String,
}

/// Qualification criteria, adjustments, and exclusions for one scheme.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRules {
    pub primary_metrics: Vec<PrimaryMetric>,
    pub min_qualification: f64,
    pub adjustments: Vec<Adjustment>,
    pub exclusions: Vec<Exclusion>,
}

/// One slice of a transaction's credit, attributed to a participant role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLevel {
    pub role: String,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How one transaction's credit splits across participant roles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreditRules {
    pub levels: Vec<CreditLevel>,
}

/// Single condition inside a custom rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: FieldValue,
}

/// How a fired custom rule acts on the running payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpactType {
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    #[serde(rename = "MONETARY")]
    Monetary,
}

/// Named, fully-conditioned payout modifier applied last, in authored
/// order. Fires only when every condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRule {
    pub name: String,
    pub description: String,
    pub conditions: Vec<RuleCondition>,
    pub impact_type: ImpactType,
    pub impact_value: f64,
    pub active: bool,
}

/// Lifecycle state of one scheme version. Persisted and transmitted as
/// the exact upper-case strings; anything else is invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemeStatus {
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "SIMULATION")]
    Simulation,
    #[serde(rename = "PRODUCTION")]
    Production,
}

impl SchemeStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SchemeStatus::Draft => "DRAFT",
            SchemeStatus::Approved => "APPROVED",
            SchemeStatus::Simulation => "SIMULATION",
            SchemeStatus::Production => "PRODUCTION",
        }
    }

    /// Promotion ladder: DRAFT -> APPROVED -> SIMULATION -> PRODUCTION.
    /// Re-asserting the current status is allowed; skipping stages and
    /// demotions are not.
    pub fn can_transition_to(self, target: SchemeStatus) -> bool {
        use SchemeStatus::*;
        matches!(
            (self, target),
            (Draft, Approved) | (Approved, Simulation) | (Simulation, Production)
        ) || self == target
    }
}

impl Default for SchemeStatus {
    fn default() -> Self {
        SchemeStatus::Draft
    }
}

impl fmt::Display for SchemeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid scheme status '{0}', expected DRAFT, APPROVED, SIMULATION, or PRODUCTION")]
pub struct InvalidStatus(pub String);

impl FromStr for SchemeStatus {
    type Err = InvalidStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DRAFT" => Ok(SchemeStatus::Draft),
            "APPROVED" => Ok(SchemeStatus::Approved),
            "SIMULATION" => Ok(SchemeStatus::Simulation),
            "PRODUCTION" => Ok(SchemeStatus::Production),
            other => Err(InvalidStatus(other.to_string())),
        }
    }
}

/// Provenance stamped on every stored version. `created_at` is inherited
/// across versions of the same `scheme_id`; `updated_at` refreshes on
/// every write; `version` is monotonic per `scheme_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u32,
    pub status: SchemeStatus,
}

impl PlanMetadata {
    pub fn initial(now: DateTime<Utc>, status: SchemeStatus) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            version: 1,
            status,
        }
    }
}

/// One version of an incentive compensation scheme document.
///
/// `scheme_id` groups sibling versions; `doc_id` identifies this one.
/// The four rule blocks are exclusively owned by the document; KPI names
/// inside them reference the catalog by name only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveScheme {
    pub doc_id: SchemeDocId,
    pub scheme_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub effective_start: NaiveDate,
    pub effective_end: NaiveDate,
    pub currency: String,
    pub revenue_base: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_field: Option<String>,
    pub participants: Vec<String>,
    pub sales_quota: f64,
    pub commission_structure: CommissionStructure,
    pub measurement_rules: MeasurementRules,
    pub credit_rules: CreditRules,
    pub custom_rules: Vec<CustomRule>,
    pub metadata: PlanMetadata,
}

impl IncentiveScheme {
    /// The dataset field carrying the qualifying measure: the configured
    /// base field when present, otherwise the revenue base itself.
    pub fn measure_field(&self) -> &str {
        self.base_field.as_deref().unwrap_or(&self.revenue_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_exact_wire_strings() {
        for (status, wire) in [
            (SchemeStatus::Draft, "\"DRAFT\""),
            (SchemeStatus::Approved, "\"APPROVED\""),
            (SchemeStatus::Simulation, "\"SIMULATION\""),
            (SchemeStatus::Production, "\"PRODUCTION\""),
        ] {
            assert_eq!(serde_json::to_string(&status).expect("serializes"), wire);
            let parsed: SchemeStatus =
                serde_json::from_str(wire).expect("round-trips through serde");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn fifth_status_string_is_rejected() {
        assert!("ARCHIVED".parse::<SchemeStatus>().is_err());
        assert!("draft".parse::<SchemeStatus>().is_err());
        assert!(serde_json::from_str::<SchemeStatus>("\"ARCHIVED\"").is_err());
    }

    #[test]
    fn promotion_ladder_is_enforced_in_order() {
        use SchemeStatus::*;
        assert!(Draft.can_transition_to(Approved));
        assert!(Approved.can_transition_to(Simulation));
        assert!(Simulation.can_transition_to(Production));
        assert!(Production.can_transition_to(Production));
        assert!(!Draft.can_transition_to(Production));
        assert!(!Production.can_transition_to(Draft));
        assert!(!Approved.can_transition_to(Draft));
    }

    #[test]
    fn operators_round_trip_as_symbols() {
        let json = serde_json::to_string(&ComparisonOperator::GreaterOrEqual).expect("serializes");
        assert_eq!(json, "\">=\"");
        let op: ComparisonOperator = serde_json::from_str("\"!=\"").expect("deserializes");
        assert_eq!(op, ComparisonOperator::NotEqual);
        assert!(!op.is_numeric());
        assert!(ComparisonOperator::LessThan.is_numeric());
    }

    #[test]
    fn field_values_deserialize_untagged() {
        let number: FieldValue = serde_json::from_str("42.5").expect("number");
        assert_eq!(number, FieldValue::Number(42.5));
        let text: FieldValue = serde_json::from_str("\"EMEA\"").expect("text");
        assert_eq!(text, FieldValue::Text("EMEA".to_string()));
        assert_eq!(FieldValue::Text(" 12 ".to_string()).as_number(), Some(12.0));
        assert_eq!(FieldValue::Text("EMEA".to_string()).as_number(), None);
    }

    #[test]
    fn measure_field_prefers_base_field() {
        let mut scheme = crate::scheme::test_support::sample_scheme("scheme-test");
        scheme.base_field = Some("netAmount".to_string());
        assert_eq!(scheme.measure_field(), "netAmount");
        scheme.base_field = None;
        assert_eq!(scheme.measure_field(), scheme.revenue_base);
    }
}
