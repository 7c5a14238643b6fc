//! Customer profile data structures for churn scoring

use serde::{Deserialize, Serialize};

/// A categorical attribute with a closed value set.
///
/// `code` is the zero-based position of the value in its declared set and is
/// what numeric-only model runtimes receive.
pub trait Category: Copy {
    /// Wire spelling of the value
    fn label(&self) -> &'static str;

    /// Position in the declared value set
    fn code(&self) -> usize;
}

macro_rules! category {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// All values in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl Category for $name {
            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            fn code(&self) -> usize {
                $name::ALL
                    .iter()
                    .position(|v| v == self)
                    .unwrap_or_default()
            }
        }
    };
}

category! {
    /// Customer gender
    Gender {
        Male => "M",
        Female => "F",
    }
}

category! {
    /// Highest completed education
    EducationLevel {
        Uneducated => "Uneducated",
        HighSchool => "High School",
        College => "College",
        Graduate => "Graduate",
        PostGraduate => "Post-Graduate",
        Doctorate => "Doctorate",
        Unknown => "Unknown",
    }
}

category! {
    /// Marital status
    MaritalStatus {
        Single => "Single",
        Married => "Married",
        Divorced => "Divorced",
        Unknown => "Unknown",
    }
}

category! {
    /// Annual income bracket
    IncomeCategory {
        LessThan40K => "Less than $40K",
        From40KTo60K => "$40K - $60K",
        From60KTo80K => "$60K - $80K",
        From80KTo120K => "$80K - $120K",
        Above120K => "$120K +",
        Unknown => "Unknown",
    }
}

category! {
    /// Card product tier
    CardCategory {
        Blue => "Blue",
        Silver => "Silver",
        Gold => "Gold",
        Platinum => "Platinum",
    }
}

/// Count fields accept any JSON number with no fractional part, so `45` and
/// `45.0` both read as 45 while `70.5` is rejected.
mod whole_number {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use serde::Deserialize;
    use std::fmt;

    struct WholeNumber;

    impl<'de> Visitor<'de> for WholeNumber {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(v), &self))
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(WholeNumber)
    }

    #[derive(Deserialize)]
    struct Whole(#[serde(deserialize_with = "deserialize")] i64);

    pub fn deserialize_option<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        Ok(Option::<Whole>::deserialize(deserializer)?.map(|Whole(v)| v))
    }
}

/// A validated bank customer profile.
///
/// Field names on the wire follow the bank's data set columns
/// (`Customer_Age`, `Total_Trans_Ct`, ...); the snake_case field names are
/// accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Age in years
    #[serde(
        rename = "Customer_Age",
        alias = "age",
        deserialize_with = "whole_number::deserialize"
    )]
    pub age: i64,

    #[serde(rename = "Gender", alias = "gender")]
    pub gender: Gender,

    /// Number of dependents
    #[serde(
        rename = "Dependent_count",
        alias = "dependent_count",
        deserialize_with = "whole_number::deserialize"
    )]
    pub dependent_count: i64,

    #[serde(rename = "Education_Level", alias = "education_level")]
    pub education_level: EducationLevel,

    #[serde(rename = "Marital_Status", alias = "marital_status")]
    pub marital_status: MaritalStatus,

    #[serde(rename = "Income_Category", alias = "income_category")]
    pub income_category: IncomeCategory,

    #[serde(rename = "Card_Category", alias = "card_category")]
    pub card_category: CardCategory,

    /// Tenure with the bank in months. Required for scoring; kept optional
    /// here so a missing value is reported instead of defaulted.
    #[serde(
        rename = "Months_on_book",
        alias = "months_on_book",
        default,
        deserialize_with = "whole_number::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub months_on_book: Option<i64>,

    /// Number of products held
    #[serde(
        rename = "Total_Relationship_Count",
        alias = "total_relationship_count",
        deserialize_with = "whole_number::deserialize"
    )]
    pub total_relationship_count: i64,

    #[serde(
        rename = "Months_Inactive_12_mon",
        alias = "months_inactive_12mo",
        deserialize_with = "whole_number::deserialize"
    )]
    pub months_inactive_12mo: i64,

    /// Support contacts in the last 12 months
    #[serde(
        rename = "Contacts_Count_12_mon",
        alias = "contacts_count_12mo",
        deserialize_with = "whole_number::deserialize"
    )]
    pub contacts_count_12mo: i64,

    #[serde(rename = "Credit_Limit", alias = "credit_limit")]
    pub credit_limit: f64,

    /// Unpaid balance carried month to month
    #[serde(rename = "Total_Revolving_Bal", alias = "total_revolving_balance")]
    pub total_revolving_balance: f64,

    #[serde(
        rename = "Avg_Open_To_Buy",
        alias = "avg_open_to_buy",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_open_to_buy: Option<f64>,

    /// Transaction amount change, Q4 over Q1
    #[serde(rename = "Total_Amt_Chng_Q4_Q1", alias = "total_amt_change_q4_q1")]
    pub total_amt_change_q4_q1: f64,

    /// Total transaction amount, last 12 months
    #[serde(rename = "Total_Trans_Amt", alias = "total_trans_amt")]
    pub total_trans_amt: f64,

    /// Total transaction count, last 12 months
    #[serde(
        rename = "Total_Trans_Ct",
        alias = "total_trans_ct",
        deserialize_with = "whole_number::deserialize"
    )]
    pub total_trans_ct: i64,

    /// Transaction count change, Q4 over Q1
    #[serde(rename = "Total_Ct_Chng_Q4_Q1", alias = "total_ct_change_q4_q1")]
    pub total_ct_change_q4_q1: f64,

    #[serde(
        rename = "Avg_Utilization_Ratio",
        alias = "avg_utilization_ratio",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub avg_utilization_ratio: Option<f64>,
}

impl CustomerProfile {
    /// Wire names of the fields that must be present and non-null.
    pub const REQUIRED_FIELDS: [&'static str; 17] = [
        "Customer_Age",
        "Gender",
        "Dependent_count",
        "Education_Level",
        "Marital_Status",
        "Income_Category",
        "Card_Category",
        "Months_on_book",
        "Total_Relationship_Count",
        "Months_Inactive_12_mon",
        "Contacts_Count_12_mon",
        "Credit_Limit",
        "Total_Revolving_Bal",
        "Total_Amt_Chng_Q4_Q1",
        "Total_Trans_Amt",
        "Total_Trans_Ct",
        "Total_Ct_Chng_Q4_Q1",
    ];

    /// Reference profile of a long-standing, moderately active customer.
    ///
    /// Values match the defaults the bank's analysts start from.
    pub fn reference() -> Self {
        Self {
            age: 45,
            gender: Gender::Male,
            dependent_count: 2,
            education_level: EducationLevel::Graduate,
            marital_status: MaritalStatus::Married,
            income_category: IncomeCategory::From60KTo80K,
            card_category: CardCategory::Blue,
            months_on_book: Some(36),
            total_relationship_count: 4,
            months_inactive_12mo: 2,
            contacts_count_12mo: 3,
            credit_limit: 8500.0,
            total_revolving_balance: 1500.0,
            avg_open_to_buy: None,
            total_amt_change_q4_q1: 0.75,
            total_trans_amt: 4500.0,
            total_trans_ct: 70,
            total_ct_change_q4_q1: 0.65,
            avg_utilization_ratio: None,
        }
    }
}
