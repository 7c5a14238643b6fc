//! NATS publisher for scoring responses

use crate::types::prediction::ScoringResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses to the requester, or to a fallback subject
#[derive(Clone)]
pub struct ResponsePublisher {
    client: Client,
    subject: String,
}

impl ResponsePublisher {
    /// Create a new response publisher with a fallback subject
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a response to `reply`, or to the fallback subject when the
    /// request carried none.
    pub async fn publish(&self, reply: Option<Subject>, response: &ScoringResponse) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let target = reply.unwrap_or_else(|| Subject::from(self.subject.as_str()));

        debug!(subject = %target, bytes = payload.len(), "Publishing scoring response");

        self.client.publish(target, payload.into()).await?;

        Ok(())
    }

    /// Get the fallback subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
