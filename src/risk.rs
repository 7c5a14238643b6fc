//! Retention risk policy: maps model output to a business decision.

use serde::{Deserialize, Serialize};

/// Probability at or above which a customer is Critical.
pub const CRITICAL_THRESHOLD: f64 = 0.70;
/// Probability at or above which a customer is High risk.
pub const HIGH_THRESHOLD: f64 = 0.30;
/// Probability at or above which a customer goes on the watchlist.
pub const WATCHLIST_THRESHOLD: f64 = 0.02;

/// Retention risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    None,
    /// Watchlist: passive monitoring only
    Low,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::None,
        RiskTier::Low,
        RiskTier::High,
        RiskTier::Critical,
    ];

    /// Determine the tier from a churn probability. First match wins and
    /// lower bounds are inclusive.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= CRITICAL_THRESHOLD {
            RiskTier::Critical
        } else if probability >= HIGH_THRESHOLD {
            RiskTier::High
        } else if probability >= WATCHLIST_THRESHOLD {
            RiskTier::Low
        } else {
            RiskTier::None
        }
    }

    /// Retention action the business attaches to this tier.
    pub fn recommended_action(&self) -> &'static str {
        match self {
            RiskTier::Critical => {
                "CRITICAL RISK: Call Immediately & Offer VIP Retention Package ($20 cost)"
            }
            RiskTier::High => "HIGH RISK: Send $10 Discount Voucher",
            RiskTier::Low => "LOW RISK (WATCHLIST): Send Automated 'We Miss You' Email",
            RiskTier::None => "No Action",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::None => "none",
            RiskTier::Low => "low",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        }
    }
}

/// Hard classification of the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChurnStatus {
    #[serde(rename = "Existing Customer")]
    Existing,
    #[serde(rename = "Attrited Customer")]
    Attrited,
}

impl ChurnStatus {
    /// Label 1 is attrition; anything else is treated as existing.
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            ChurnStatus::Attrited
        } else {
            ChurnStatus::Existing
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChurnStatus::Existing => "Existing Customer",
            ChurnStatus::Attrited => "Attrited Customer",
        }
    }
}

/// Outcome of the risk policy for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub status: ChurnStatus,
    pub tier: RiskTier,
    pub recommended_action: &'static str,
}

/// Applies the fixed retention thresholds.
///
/// The status follows the model's hard label while the tier follows the
/// probability, so an "Existing Customer" can still get a Critical action.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, label: u8, probability: f64) -> RiskAssessment {
        let tier = RiskTier::from_probability(probability);
        RiskAssessment {
            status: ChurnStatus::from_label(label),
            tier,
            recommended_action: tier.recommended_action(),
        }
    }
}
