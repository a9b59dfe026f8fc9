use crate::catalog::KpiDataType;
use crate::scheme::{ComparisonOperator, FieldValue};

/// Evaluate `actual operator expected`. A missing field never matches,
/// and ordering operators fail closed when either side is non-numeric.
pub(crate) fn operand_matches(
    actual: Option<&FieldValue>,
    operator: ComparisonOperator,
    expected: &FieldValue,
    data_type: Option<KpiDataType>,
) -> bool {
    let Some(actual) = actual else {
        return false;
    };

    match operator {
        ComparisonOperator::GreaterThan
        | ComparisonOperator::GreaterOrEqual
        | ComparisonOperator::LessThan
        | ComparisonOperator::LessOrEqual => {
            match (actual.as_number(), expected.as_number()) {
                (Some(lhs), Some(rhs)) => match operator {
                    ComparisonOperator::GreaterThan => lhs > rhs,
                    ComparisonOperator::GreaterOrEqual => lhs >= rhs,
                    ComparisonOperator::LessThan => lhs < rhs,
                    ComparisonOperator::LessOrEqual => lhs <= rhs,
                    _ => unreachable!("outer match covers ordering operators only"),
                },
                _ => false,
            }
        }
        ComparisonOperator::Equal => values_equal(actual, expected, data_type),
        ComparisonOperator::NotEqual => !values_equal(actual, expected, data_type),
    }
}

/// Equality semantics depend on the KPI's declared data type: `Number`
/// compares numerically, everything else as case-sensitive strings. With
/// no declaration, two numerically coercible values compare as numbers.
fn values_equal(actual: &FieldValue, expected: &FieldValue, data_type: Option<KpiDataType>) -> bool {
    let numeric = match data_type {
        Some(KpiDataType::Number) => true,
        Some(_) => false,
        None => actual.as_number().is_some() && expected.as_number().is_some(),
    };
    if numeric {
        if let (Some(lhs), Some(rhs)) = (actual.as_number(), expected.as_number()) {
            return lhs == rhs;
        }
    }
    actual.to_string() == expected.to_string()
}
