//! Feature engineering for churn model inference.
//!
//! Recreates the derived columns the classifier was trained on and lays the
//! profile out in the classifier's exact column order.

use crate::error::{InferenceError, Result};
use crate::types::profile::{Category, CustomerProfile};

/// Added to every ratio divisor so zero counts and limits stay finite.
pub const EPSILON: f64 = 0.001;

/// Number of columns in a feature vector.
pub const FEATURE_COUNT: usize = 22;

/// Column names, in the order the classifier expects them.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    // Raw profile columns (18)
    "Customer_Age",
    "Gender",
    "Dependent_count",
    "Education_Level",
    "Marital_Status",
    "Income_Category",
    "Card_Category",
    "Total_Relationship_Count",
    "Months_Inactive_12_mon",
    "Contacts_Count_12_mon",
    "Credit_Limit",
    "Total_Revolving_Bal",
    "Avg_Open_To_Buy",
    "Total_Amt_Chng_Q4_Q1",
    "Total_Trans_Amt",
    "Total_Trans_Ct",
    "Total_Ct_Chng_Q4_Q1",
    "Avg_Utilization_Ratio",
    // Engineered (4)
    "Age_at_Onboarding",
    "Avg_Trans_Value",
    "Trans_to_Limit_Ratio",
    "Activity_Per_Relationship",
];

/// A single feature column value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    /// Wire label plus position in the declared value set
    Categorical { label: &'static str, code: usize },
}

impl FeatureValue {
    fn category<C: Category>(value: C) -> Self {
        FeatureValue::Categorical {
            label: value.label(),
            code: value.code(),
        }
    }

    /// Numeric form: the value itself, or the category code.
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Numeric(v) => v,
            FeatureValue::Categorical { code, .. } => code as f64,
        }
    }
}

/// Fixed-order model input. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: [FeatureValue; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn values(&self) -> &[FeatureValue; FEATURE_COUNT] {
        &self.values
    }

    /// Look up a column by name.
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| &self.values[i])
    }

    /// Numeric value of a column by name.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.get(name).map(FeatureValue::as_f64)
    }

    /// Column name/value pairs, in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FeatureValue)> {
        FEATURE_NAMES.iter().copied().zip(self.values.iter())
    }

    /// Encode as a dense f32 row for numeric-only runtimes.
    ///
    /// Values beyond the f32 range narrow to infinity; callers feeding a
    /// model should check the row.
    pub fn to_f32(&self) -> Vec<f32> {
        self.values.iter().map(|v| v.as_f64() as f32).collect()
    }
}

/// Derives model features from a customer profile.
///
/// Pure and deterministic: no I/O, no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Build the feature vector for a profile.
    ///
    /// Fails when `months_on_book` is missing, since `Age_at_Onboarding` is a
    /// mandatory column.
    pub fn engineer(&self, profile: &CustomerProfile) -> Result<FeatureVector> {
        let months_on_book = profile.months_on_book.ok_or_else(|| {
            InferenceError::FeatureEngineering(
                "months_on_book is required to derive Age_at_Onboarding".to_string(),
            )
        })?;

        let age = profile.age as f64;
        let trans_ct = profile.total_trans_ct as f64;

        let age_at_onboarding = age - months_on_book as f64 / 12.0;
        let avg_trans_value = profile.total_trans_amt / (trans_ct + EPSILON);
        let trans_to_limit_ratio = profile.total_trans_amt / (profile.credit_limit + EPSILON);
        let activity_per_relationship =
            trans_ct / (profile.total_relationship_count as f64 + EPSILON);

        // Both optional columns are identities of limit and balance in the training data
        let avg_open_to_buy = profile
            .avg_open_to_buy
            .unwrap_or(profile.credit_limit - profile.total_revolving_balance);
        let avg_utilization_ratio = profile
            .avg_utilization_ratio
            .unwrap_or(profile.total_revolving_balance / (profile.credit_limit + EPSILON));

        use FeatureValue::Numeric;
        let values = [
            Numeric(age),
            FeatureValue::category(profile.gender),
            Numeric(profile.dependent_count as f64),
            FeatureValue::category(profile.education_level),
            FeatureValue::category(profile.marital_status),
            FeatureValue::category(profile.income_category),
            FeatureValue::category(profile.card_category),
            Numeric(profile.total_relationship_count as f64),
            Numeric(profile.months_inactive_12mo as f64),
            Numeric(profile.contacts_count_12mo as f64),
            Numeric(profile.credit_limit),
            Numeric(profile.total_revolving_balance),
            Numeric(avg_open_to_buy),
            Numeric(profile.total_amt_change_q4_q1),
            Numeric(profile.total_trans_amt),
            Numeric(trans_ct),
            Numeric(profile.total_ct_change_q4_q1),
            Numeric(avg_utilization_ratio),
            Numeric(age_at_onboarding),
            Numeric(avg_trans_value),
            Numeric(trans_to_limit_ratio),
            Numeric(activity_per_relationship),
        ];

        Ok(FeatureVector { values })
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names (matching training order).
    pub fn feature_names(&self) -> &'static [&'static str; FEATURE_COUNT] {
        &FEATURE_NAMES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::profile::{CardCategory, Gender};
    use proptest::prelude::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_reference_profile_derived_features() {
        let features = FeatureEngineer::new()
            .engineer(&CustomerProfile::reference())
            .unwrap();

        assert_eq!(features.numeric("Age_at_Onboarding"), Some(42.0));
        assert!(approx(features.numeric("Avg_Trans_Value").unwrap(), 64.2848, 1e-4));
        assert!(approx(features.numeric("Trans_to_Limit_Ratio").unwrap(), 0.5294, 1e-4));
        assert!(approx(
            features.numeric("Activity_Per_Relationship").unwrap(),
            17.4956,
            1e-4
        ));
    }

    #[test]
    fn test_column_order() {
        let engineer = FeatureEngineer::new();
        let features = engineer.engineer(&CustomerProfile::reference()).unwrap();

        assert_eq!(engineer.feature_count(), 22);
        assert_eq!(features.values().len(), 22);
        assert_eq!(features.to_f32().len(), 22);

        let names: Vec<&str> = features.iter().map(|(name, _)| name).collect();
        assert_eq!(names[0], "Customer_Age");
        assert_eq!(names[6], "Card_Category");
        assert_eq!(names[12], "Avg_Open_To_Buy");
        assert_eq!(names[17], "Avg_Utilization_Ratio");
        assert_eq!(names[18], "Age_at_Onboarding");
        assert_eq!(names[21], "Activity_Per_Relationship");
        assert!(!names.contains(&"Months_on_book"));
    }

    #[test]
    fn test_categorical_columns() {
        let features = FeatureEngineer::new()
            .engineer(&CustomerProfile::reference())
            .unwrap();

        assert_eq!(
            features.get("Gender"),
            Some(&FeatureValue::Categorical { label: "M", code: 0 })
        );
        assert_eq!(
            features.get("Income_Category"),
            Some(&FeatureValue::Categorical {
                label: "$60K - $80K",
                code: 2
            })
        );
        assert_eq!(features.to_f32()[3], 3.0); // Graduate
    }

    #[test]
    fn test_optional_columns_imputed() {
        let features = FeatureEngineer::new()
            .engineer(&CustomerProfile::reference())
            .unwrap();

        assert_eq!(features.numeric("Avg_Open_To_Buy"), Some(7000.0));
        assert!(approx(
            features.numeric("Avg_Utilization_Ratio").unwrap(),
            1500.0 / 8500.0,
            1e-6
        ));
    }

    #[test]
    fn test_optional_columns_passed_through() {
        let mut profile = CustomerProfile::reference();
        profile.avg_open_to_buy = Some(6800.0);
        profile.avg_utilization_ratio = Some(0.2);

        let features = FeatureEngineer::new().engineer(&profile).unwrap();
        assert_eq!(features.numeric("Avg_Open_To_Buy"), Some(6800.0));
        assert_eq!(features.numeric("Avg_Utilization_Ratio"), Some(0.2));
    }

    #[test]
    fn test_zero_denominators_stay_finite() {
        let mut profile = CustomerProfile::reference();
        profile.total_trans_ct = 0;
        profile.credit_limit = 0.0;
        profile.total_relationship_count = 0;

        let features = FeatureEngineer::new().engineer(&profile).unwrap();

        assert_eq!(features.numeric("Avg_Trans_Value"), Some(4500.0 / 0.001));
        assert_eq!(features.numeric("Trans_to_Limit_Ratio"), Some(4500.0 / 0.001));
        assert_eq!(features.numeric("Activity_Per_Relationship"), Some(0.0));
        assert!(features.to_f32().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_epsilon_bias_is_applied_unconditionally() {
        let features = FeatureEngineer::new()
            .engineer(&CustomerProfile::reference())
            .unwrap();

        // 4500 / 70 would be 64.285714...; the epsilon shifts it slightly down
        assert_eq!(features.numeric("Avg_Trans_Value"), Some(4500.0 / (70.0 + EPSILON)));
        assert_ne!(features.numeric("Avg_Trans_Value"), Some(4500.0 / 70.0));
    }

    #[test]
    fn test_missing_months_on_book() {
        let mut profile = CustomerProfile::reference();
        profile.months_on_book = None;

        let err = FeatureEngineer::new().engineer(&profile).unwrap_err();
        assert!(matches!(err, InferenceError::FeatureEngineering(_)));
    }

    prop_compose! {
        fn arb_profile()(
            age in 18i64..100,
            female in any::<bool>(),
            months_on_book in 0i64..80,
            total_relationship_count in 0i64..8,
            total_trans_ct in 0i64..200,
            credit_limit in 0.0f64..50_000.0,
            total_revolving_balance in 0.0f64..30_000.0,
            total_trans_amt in 0.0f64..25_000.0,
            platinum in any::<bool>(),
        ) -> CustomerProfile {
            CustomerProfile {
                age,
                gender: if female { Gender::Female } else { Gender::Male },
                months_on_book: Some(months_on_book),
                total_relationship_count,
                total_trans_ct,
                credit_limit,
                total_revolving_balance,
                total_trans_amt,
                card_category: if platinum { CardCategory::Platinum } else { CardCategory::Blue },
                ..CustomerProfile::reference()
            }
        }
    }

    proptest! {
        #[test]
        fn prop_engineering_is_deterministic(profile in arb_profile()) {
            let engineer = FeatureEngineer::new();
            let first = engineer.engineer(&profile).unwrap();
            let second = engineer.engineer(&profile).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_ratio_features_are_finite(profile in arb_profile()) {
            let features = FeatureEngineer::new().engineer(&profile).unwrap();
            for name in ["Avg_Trans_Value", "Trans_to_Limit_Ratio", "Activity_Per_Relationship"] {
                let value = features.numeric(name).unwrap();
                prop_assert!(value.is_finite(), "{} = {}", name, value);
            }
        }
    }
}
