//! Tracing setup: console logging plus optional OpenTelemetry export.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Log filter directives | `info` |
//! | `LOG_FORMAT` | `json` for JSON lines, anything else for plain text | `text` |
//! | `OTEL__ENABLED` | Enable OTLP trace export | `false` |
//! | `OTEL__ENDPOINT` | OTLP gRPC endpoint | `http://localhost:4317` |
//! | `OTEL__SERVICE_NAME` | Service name in traces | `itsm-notification-hub` |
//! | `OTEL__SAMPLING_RATIO` | Trace sampling ratio (0.0-1.0) | `1.0` |

use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider as SdkTracerProvider},
    Resource,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::OtelConfig;

pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    ExporterBuild(String),
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Keeps the tracer provider alive; flushes pending spans on drop
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            tracing::info!("Shutting down OpenTelemetry tracer provider");
            if let Err(e) = provider.shutdown() {
                eprintln!("OpenTelemetry shutdown failed: {}", e);
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_telemetry(config: &OtelConfig) -> TelemetryResult<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = json_logs();

    if !config.enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json.then(|| tracing_subscriber::fmt::layer().json()))
            .with((!json).then(|| tracing_subscriber::fmt::layer()))
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

        tracing::info!("Tracing initialized (OpenTelemetry disabled)");
        return Ok(TelemetryGuard { provider: None });
    }

    let provider = init_otel_tracer(config)?;
    let tracer = provider.tracer("itsm-notification-hub");

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        endpoint = %config.endpoint,
        service_name = %config.service_name,
        sampling_ratio = config.sampling_ratio,
        "OpenTelemetry tracing initialized"
    );

    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}

fn json_logs() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn init_otel_tracer(config: &OtelConfig) -> TelemetryResult<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .build()
        .map_err(|e| TelemetryError::ExporterBuild(e.to_string()))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(sampler_for(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(Resource::new(vec![
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                config.service_name.clone(),
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            ),
        ]))
        .build();

    Ok(provider)
}

fn sampler_for(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_bounds() {
        assert!(matches!(sampler_for(1.5), Sampler::AlwaysOn));
        assert!(matches!(sampler_for(0.0), Sampler::AlwaysOff));
        assert!(matches!(sampler_for(0.25), Sampler::TraceIdRatioBased(r) if r == 0.25));
    }

    #[test]
    fn test_guard_without_provider() {
        let guard = TelemetryGuard { provider: None };
        drop(guard);
    }
}
