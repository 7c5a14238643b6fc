//! Scoring Request Producer
//!
//! Generates synthetic customer profiles and sends them to the churn scoring
//! service over NATS request/reply, logging each response.

use churn_scoring_pipeline::types::profile::{
    CardCategory, CustomerProfile, EducationLevel, Gender, IncomeCategory, MaritalStatus,
};
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

/// Which kind of customer to synthesise
#[derive(Debug, Clone, Copy)]
enum Cohort {
    Loyal,
    AtRisk,
    Malformed,
}

/// Profile generator for testing
struct ProfileGenerator {
    rng: rand::rngs::ThreadRng,
}

impl ProfileGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    fn cohort(&mut self, at_risk_rate: f64, malformed_rate: f64) -> Cohort {
        let roll: f64 = self.rng.gen();
        if roll < malformed_rate {
            Cohort::Malformed
        } else if roll < malformed_rate + at_risk_rate {
            Cohort::AtRisk
        } else {
            Cohort::Loyal
        }
    }

    fn generate(&mut self, cohort: Cohort) -> Value {
        match cohort {
            Cohort::Loyal => profile_json(self.generate_loyal()),
            Cohort::AtRisk => profile_json(self.generate_at_risk()),
            Cohort::Malformed => self.generate_malformed(),
        }
    }

    /// Active, multi-product customer with growing spend
    fn generate_loyal(&mut self) -> CustomerProfile {
        let credit_limit = self.rng.gen_range(3000.0..35000.0);
        let total_trans_ct: i64 = self.rng.gen_range(60..140);

        CustomerProfile {
            age: self.rng.gen_range(26..70),
            gender: self.pick(Gender::ALL),
            dependent_count: self.rng.gen_range(0..5),
            education_level: self.pick(EducationLevel::ALL),
            marital_status: self.pick(MaritalStatus::ALL),
            income_category: self.pick(IncomeCategory::ALL),
            card_category: self.pick(CardCategory::ALL),
            months_on_book: Some(self.rng.gen_range(13..57)),
            total_relationship_count: self.rng.gen_range(3..7),
            months_inactive_12mo: self.rng.gen_range(0..3),
            contacts_count_12mo: self.rng.gen_range(0..3),
            credit_limit,
            total_revolving_balance: self.rng.gen_range(500.0..2500.0),
            avg_open_to_buy: None,
            total_amt_change_q4_q1: self.rng.gen_range(0.7..1.5),
            total_trans_amt: total_trans_ct as f64 * self.rng.gen_range(40.0..120.0),
            total_trans_ct,
            total_ct_change_q4_q1: self.rng.gen_range(0.7..1.3),
            avg_utilization_ratio: None,
        }
    }

    /// Disengaging customer: few products, falling activity, idle balance
    fn generate_at_risk(&mut self) -> CustomerProfile {
        let total_trans_ct: i64 = self.rng.gen_range(10..50);

        CustomerProfile {
            age: self.rng.gen_range(26..70),
            gender: self.pick(Gender::ALL),
            dependent_count: self.rng.gen_range(0..5),
            education_level: self.pick(EducationLevel::ALL),
            marital_status: self.pick(MaritalStatus::ALL),
            income_category: self.pick(IncomeCategory::ALL),
            card_category: CardCategory::Blue,
            months_on_book: Some(self.rng.gen_range(13..57)),
            total_relationship_count: self.rng.gen_range(1..3),
            months_inactive_12mo: self.rng.gen_range(3..7),
            contacts_count_12mo: self.rng.gen_range(3..7),
            credit_limit: self.rng.gen_range(1500.0..10000.0),
            total_revolving_balance: self.rng.gen_range(0.0..500.0),
            avg_open_to_buy: None,
            total_amt_change_q4_q1: self.rng.gen_range(0.2..0.6),
            total_trans_amt: total_trans_ct as f64 * self.rng.gen_range(30.0..70.0),
            total_trans_ct,
            total_ct_change_q4_q1: self.rng.gen_range(0.1..0.55),
            avg_utilization_ratio: None,
        }
    }

    /// A request the service must reject
    fn generate_malformed(&mut self) -> Value {
        let profile = self.generate_loyal();
        let mut json = profile_json(profile);

        if let Some(fields) = json.as_object_mut() {
            match self.rng.gen_range(0..3) {
                0 => {
                    fields.remove("Months_on_book");
                }
                1 => {
                    fields.insert("Card_Category".to_string(), Value::from("Diamond"));
                }
                _ => {
                    fields.insert("Total_Trans_Ct".to_string(), Value::from("seventy"));
                }
            }
        }
        json
    }

    fn pick<T: Copy>(&mut self, choices: &[T]) -> T {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn profile_json(profile: CustomerProfile) -> Value {
    serde_json::to_value(profile).unwrap_or(Value::Null)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("request_producer=info".parse()?),
        )
        .init();

    info!("Starting Scoring Request Producer");

    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("churn.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let malformed_rate: f64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(0.05);
    let delay_ms: u64 = args.get(6).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        at_risk_rate = at_risk_rate,
        malformed_rate = malformed_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, at_risk_rate, malformed_rate, delay_ms).await;
        }
    };

    let mut generator = ProfileGenerator::new();
    let mut scored = 0u64;
    let mut rejected = 0u64;

    for i in 0..count {
        let cohort = generator.cohort(at_risk_rate, malformed_rate);
        let payload = serde_json::to_vec(&generator.generate(cohort))?;

        match client.request(subject.to_string(), payload.into()).await {
            Ok(reply) => {
                let response: Value = serde_json::from_slice(&reply.payload)?;
                if response.get("error").is_some() {
                    rejected += 1;
                } else {
                    scored += 1;
                }
                info!(request = i + 1, cohort = ?cohort, response = %response, "Received response");
            }
            Err(e) => {
                warn!(request = i + 1, error = %e, "Request failed");
            }
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} requests ({} scored, {} rejected)",
        count, scored, rejected
    );

    Ok(())
}

async fn run_dry_mode(
    count: u64,
    at_risk_rate: f64,
    malformed_rate: f64,
    delay_ms: u64,
) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ProfileGenerator::new();

    for i in 0..count {
        let cohort = generator.cohort(at_risk_rate, malformed_rate);
        let json = serde_json::to_string_pretty(&generator.generate(cohort))?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample {:?} profile {}:\n{}", cohort, i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
