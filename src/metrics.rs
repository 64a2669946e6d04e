use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Registry, opts,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

trait ResultExt<T> {
    fn or_exit(self, context: &str) -> T;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_exit(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                eprintln!("failed to initialize metric ({context}): {err}");
                std::process::exit(1);
            }
        }
    }
}

pub static OPERATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec_with_registry!(
        opts!(
            "certcache_operations_total",
            "Cache operations by backend, operation and outcome"
        ),
        &["backend", "operation", "outcome"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec_with_registry!(
        HistogramOpts::new(
            "certcache_operation_duration_seconds",
            "Duration of backend calls in seconds"
        ),
        &["backend", "operation"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static PRECACHE: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec_with_registry!(
        opts!("certcache_precache_total", "Precache lookups, hit or miss"),
        &["result"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

/// Encode all metrics in the Prometheus text format
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded
pub fn encode_metrics() -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let encoder = prometheus::TextEncoder::new();

    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| format!("could not encode custom metrics: {e}"))?;

    Ok(buffer)
}
