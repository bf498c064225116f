use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Store Metrics (MongoDB)
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "db_operations_total",
        "Total number of database operations",
        &["operation", "collection", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "db_operation_duration_seconds",
        "Database operation duration in seconds",
        &["operation", "collection"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Cache Metrics (Redis)
    pub static ref CACHE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_operations_total",
        "Total number of cache operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "cache_lookups_total",
        "Leaderboard cache lookups by result",
        &["result"]
    )
    .unwrap();

    // Progression Metrics
    pub static ref ACTIVITIES_LOGGED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "activities_logged_total",
        "Total number of logged activities",
        &["kind"]
    )
    .unwrap();

    pub static ref XP_AWARDED_TOTAL: IntCounter = register_int_counter!(
        "xp_awarded_total",
        "Total XP awarded across all learners"
    )
    .unwrap();

    pub static ref LEVEL_UPS_TOTAL: IntCounter = register_int_counter!(
        "level_ups_total",
        "Number of activities that moved a learner to a new level"
    )
    .unwrap();

    pub static ref LAB_VERIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lab_verifications_total",
        "Lab and project verifications by result",
        &["result"]
    )
    .unwrap();

    pub static ref PROGRESS_RESETS_TOTAL: IntCounter = register_int_counter!(
        "progress_resets_total",
        "Number of explicit learner progress resets"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track store operation with metrics
pub async fn track_db_operation<F, T>(
    operation: &str,
    collection: &str,
    future: F,
) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, collection, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation, collection])
        .observe(duration);

    result
}

/// Helper: track cache operation with metrics
pub async fn track_cache_operation<F, T>(operation: &str, future: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let result = future.await;
    let status = if result.is_ok() { "success" } else { "error" };

    CACHE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    result
}

pub fn record_cache_hit() {
    CACHE_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
}

pub fn record_cache_miss() {
    CACHE_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics() {
        ACTIVITIES_LOGGED_TOTAL
            .with_label_values(&["study_session"])
            .inc();

        let output = render_metrics().unwrap();
        assert!(output.contains("activities_logged_total"));
    }

    #[tokio::test]
    async fn test_track_db_operation_counts_errors() {
        let before = DB_OPERATIONS_TOTAL
            .with_label_values(&["find", "metrics_test", "error"])
            .get();

        let result: anyhow::Result<()> =
            track_db_operation("find", "metrics_test", async { Err(anyhow::anyhow!("down")) })
                .await;

        assert!(result.is_err());
        assert_eq!(
            DB_OPERATIONS_TOTAL
                .with_label_values(&["find", "metrics_test", "error"])
                .get(),
            before + 1
        );
    }
}
