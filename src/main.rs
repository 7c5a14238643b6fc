//! Churn Scoring Service - Main Entry Point
//!
//! Consumes customer profiles from NATS, scores them against the churn
//! classifier and replies with the prediction and retention action.

use anyhow::Result;
use churn_scoring_pipeline::{
    config::{AppConfig, LoggingConfig, ModelConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, PipelineMetrics},
    models::ModelLoader,
    pipeline::InferenceOrchestrator,
    producer::ResponsePublisher,
    worker::WorkerPool,
    InferenceError, ScoringResponse,
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Churn Scoring Service");
    info!(
        request_subject = %config.nats.request_subject,
        workers = config.pipeline.workers,
        model = %config.model.path,
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(PipelineMetrics::new());

    // A missing model does not stop the service; requests fail fast instead
    let orchestrator = Arc::new(build_orchestrator(&config.model));

    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let publisher = Arc::new(ResponsePublisher::new(
        client.clone(),
        &config.nats.response_subject,
    ));

    let pool = WorkerPool::new(config.pipeline.workers);
    let processed_count = Arc::new(AtomicU64::new(0));

    let metrics_clone = metrics.clone();
    let interval_secs = config.pipeline.metrics_interval_secs;
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, interval_secs);
        reporter.start().await;
    });

    let mut subscription = consumer.subscribe().await?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            next = subscription.next() => match next {
                Some(message) => message,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        // Acquire permit (limits concurrent requests)
        let permit = pool.acquire().await?;

        let orchestrator = orchestrator.clone();
        let publisher = publisher.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();
            let reply = message.reply.clone();
            let payload = message.payload;

            // Model inference is CPU bound; keep it off the async workers
            let outcome = match tokio::task::spawn_blocking(move || {
                orchestrator.infer_slice(&payload)
            })
            .await
            {
                Ok(outcome) => outcome,
                Err(e) => Err(InferenceError::Prediction(format!(
                    "Inference task failed: {}",
                    e
                ))),
            };

            let processing_time = start_time.elapsed();

            match &outcome {
                Ok(result) => {
                    metrics.record_prediction(processing_time, result.probability, result.risk_tier);
                    debug!(
                        prediction = result.label.as_str(),
                        churn_probability = result.probability,
                        risk_tier = result.risk_tier.as_str(),
                        processing_time_us = processing_time.as_micros(),
                        "Request scored"
                    );
                }
                Err(e) if e.is_client_error() => {
                    metrics.record_failure(processing_time, e.kind());
                    warn!(kind = %e.kind(), error = %e, "Rejected scoring request");
                }
                Err(e) => {
                    metrics.record_failure(processing_time, e.kind());
                    error!(kind = %e.kind(), error = %e, "Scoring failed");
                }
            }

            let response = ScoringResponse::from(outcome);
            if let Err(e) = publisher.publish(reply, &response).await {
                error!(error = %e, "Failed to publish scoring response");
            }

            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;
            if count % 100 == 0 {
                let stats = metrics.get_processing_stats();
                info!(
                    processed = count,
                    throughput = format!("{:.1} req/s", metrics.get_throughput()),
                    avg_latency_us = stats.mean_us,
                    "Processing milestone"
                );
            }

            drop(permit);
        });
    }

    info!(in_flight = pool.in_flight(), "Service shutting down, draining in-flight requests");
    pool.drain().await?;
    client.flush().await?;
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("churn_scoring_pipeline={}", logging.level).parse()?);

    match logging.format.as_str() {
        "pretty" => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    Ok(())
}

fn build_orchestrator(model: &ModelConfig) -> InferenceOrchestrator {
    let loaded = ModelLoader::with_threads(model.onnx_threads)
        .and_then(|loader| loader.load(&model.path));

    match loaded {
        Ok(classifier) => {
            let orchestrator = InferenceOrchestrator::new(Arc::new(classifier));
            info!(
                model = orchestrator.model_name().unwrap_or_default(),
                "Inference pipeline ready"
            );
            orchestrator
        }
        Err(e) => {
            error!(
                path = %model.path,
                error = %e,
                "Failed to load classifier, every request will fail with model_unavailable"
            );
            InferenceOrchestrator::unavailable(format!("Model not loaded: {:#}", e))
        }
    }
}
