//! Boundary validation of raw scoring requests.

use crate::error::{InferenceError, Result};
use crate::types::profile::CustomerProfile;
use serde::Deserialize;
use serde_json::Value;

/// Turns raw, untyped request records into [`CustomerProfile`]s.
///
/// Type and enum membership are enforced; numeric ranges are not. A negative
/// dependent count is odd but still scorable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileValidator;

impl ProfileValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a JSON record.
    pub fn validate(&self, raw: &Value) -> Result<CustomerProfile> {
        if !raw.is_object() {
            return Err(InferenceError::Validation(format!(
                "expected a JSON object, got {}",
                json_type_name(raw)
            )));
        }

        let profile = CustomerProfile::deserialize(raw)
            .map_err(|e| InferenceError::Validation(e.to_string()))?;

        if profile.months_on_book.is_none() {
            return Err(InferenceError::Validation(
                "missing field `Months_on_book`".to_string(),
            ));
        }

        Ok(profile)
    }

    /// Parse and validate a raw JSON payload.
    pub fn validate_slice(&self, payload: &[u8]) -> Result<CustomerProfile> {
        let raw: Value = serde_json::from_slice(payload)
            .map_err(|e| InferenceError::Validation(format!("malformed JSON: {}", e)))?;
        self.validate(&raw)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{CardCategory, Gender, IncomeCategory};
    use serde_json::json;

    fn raw_reference() -> Value {
        json!({
            "Customer_Age": 45,
            "Gender": "M",
            "Dependent_count": 2,
            "Education_Level": "Graduate",
            "Marital_Status": "Married",
            "Income_Category": "$60K - $80K",
            "Card_Category": "Blue",
            "Months_on_book": 36,
            "Total_Relationship_Count": 4,
            "Months_Inactive_12_mon": 2,
            "Contacts_Count_12_mon": 3,
            "Credit_Limit": 8500.0,
            "Total_Revolving_Bal": 1500.0,
            "Total_Amt_Chng_Q4_Q1": 0.75,
            "Total_Trans_Amt": 4500,
            "Total_Trans_Ct": 70,
            "Total_Ct_Chng_Q4_Q1": 0.65
        })
    }

    fn validation_message(raw: &Value) -> String {
        match ProfileValidator::new().validate(raw) {
            Err(InferenceError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_profile() {
        let profile = ProfileValidator::new().validate(&raw_reference()).unwrap();

        assert_eq!(profile, CustomerProfile::reference());
        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.income_category, IncomeCategory::From60KTo80K);
        assert_eq!(profile.total_trans_amt, 4500.0);
        assert_eq!(profile.avg_open_to_buy, None);
    }

    #[test]
    fn test_snake_case_aliases() {
        let raw = json!({
            "age": 30,
            "gender": "F",
            "dependent_count": 0,
            "education_level": "Doctorate",
            "marital_status": "Single",
            "income_category": "Unknown",
            "card_category": "Gold",
            "months_on_book": 12,
            "total_relationship_count": 1,
            "months_inactive_12mo": 0,
            "contacts_count_12mo": 0,
            "credit_limit": 20000.0,
            "total_revolving_balance": 0.0,
            "avg_open_to_buy": 20000.0,
            "total_amt_change_q4_q1": 1.0,
            "total_trans_amt": 15000.0,
            "total_trans_ct": 120,
            "total_ct_change_q4_q1": 1.1,
            "avg_utilization_ratio": 0.0
        });

        let profile = ProfileValidator::new().validate(&raw).unwrap();
        assert_eq!(profile.card_category, CardCategory::Gold);
        assert_eq!(profile.avg_open_to_buy, Some(20000.0));
        assert_eq!(profile.avg_utilization_ratio, Some(0.0));
    }

    #[test]
    fn test_missing_required_field() {
        let mut raw = raw_reference();
        raw.as_object_mut().unwrap().remove("Credit_Limit");

        assert!(validation_message(&raw).contains("Credit_Limit"));
    }

    #[test]
    fn test_missing_months_on_book() {
        let mut raw = raw_reference();
        raw.as_object_mut().unwrap().remove("Months_on_book");
        assert!(validation_message(&raw).contains("Months_on_book"));

        raw["Months_on_book"] = Value::Null;
        assert!(validation_message(&raw).contains("Months_on_book"));
    }

    #[test]
    fn test_unknown_enum_value() {
        let mut raw = raw_reference();
        raw["Card_Category"] = json!("Diamond");

        assert!(validation_message(&raw).contains("Diamond"));
    }

    #[test]
    fn test_wrong_types() {
        let mut raw = raw_reference();
        raw["Customer_Age"] = json!("forty-five");
        validation_message(&raw);

        let mut raw = raw_reference();
        raw["Total_Trans_Ct"] = json!(70.5);
        validation_message(&raw);

        let mut raw = raw_reference();
        raw["Credit_Limit"] = Value::Null;
        validation_message(&raw);
    }

    #[test]
    fn test_whole_number_floats_are_accepted() {
        let mut raw = raw_reference();
        raw["Customer_Age"] = json!(45.0);
        raw["Total_Trans_Ct"] = json!(70.0);

        let profile = ProfileValidator::new().validate(&raw).unwrap();
        assert_eq!(profile.age, 45);
        assert_eq!(profile.total_trans_ct, 70);

        let mut raw = raw_reference();
        raw["Customer_Age"] = json!(45.5);
        assert!(validation_message(&raw).contains("whole number"));
    }

    #[test]
    fn test_out_of_range_values_are_accepted() {
        let mut raw = raw_reference();
        raw["Dependent_count"] = json!(-1);
        raw["Credit_Limit"] = json!(0.0);
        raw["Avg_Utilization_Ratio"] = json!(1.7);
        raw["Customer_Age"] = json!(130);

        let profile = ProfileValidator::new().validate(&raw).unwrap();
        assert_eq!(profile.dependent_count, -1);
        assert_eq!(profile.avg_utilization_ratio, Some(1.7));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let mut raw = raw_reference();
        raw["CLIENTNUM"] = json!(768805383);

        assert!(ProfileValidator::new().validate(&raw).is_ok());
    }

    #[test]
    fn test_non_object_input() {
        assert!(validation_message(&json!([1, 2, 3])).contains("an array"));
        assert!(validation_message(&Value::Null).contains("null"));
    }

    #[test]
    fn test_validate_slice() {
        let validator = ProfileValidator::new();
        let payload = serde_json::to_vec(&raw_reference()).unwrap();
        assert!(validator.validate_slice(&payload).is_ok());

        let err = validator.validate_slice(b"{not json").unwrap_err();
        assert!(err.message().starts_with("malformed JSON"));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let mut raw = raw_reference();
        raw["Gender"] = json!("X");

        assert_eq!(validation_message(&raw), validation_message(&raw));
    }
}
