//! Prometheus metrics setup and metric definitions

use anyhow::Context;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    let buckets = [
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    PrometheusBuilder::new()
        .set_buckets(&buckets)
        .context("Failed to set histogram buckets")?
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Register metric descriptions and emit initial zero values so Prometheus
/// output includes HELP/TYPE lines from startup.
pub fn describe_metrics() {
    describe_counter!(
        "fleetops_http_requests_total",
        "Total number of HTTP requests"
    );
    describe_histogram!(
        "fleetops_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "fleetops_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );

    describe_counter!(
        "fleetops_fuel_events_total",
        "Total number of recorded fuel events"
    );
    describe_counter!(
        "fleetops_fuel_anomalies_detected_total",
        "Fuel consumption anomalies raised at event creation"
    );
    describe_counter!(
        "fleetops_fuel_anomalies_checked_total",
        "Fuel consumption anomalies checked off by an auditor"
    );
    describe_counter!(
        "fleetops_fuel_limit_warnings_total",
        "Over-limit warnings attached to fuel events, by window"
    );
    describe_counter!(
        "fleetops_rls_policy_violations_total",
        "Writes rejected by a row-level security policy"
    );

    counter!("fleetops_fuel_events_total").absolute(0);
    counter!("fleetops_fuel_anomalies_detected_total").absolute(0);
    counter!("fleetops_fuel_anomalies_checked_total").absolute(0);
    for window in ["daily", "weekly", "monthly"] {
        counter!("fleetops_fuel_limit_warnings_total", "window" => window).absolute(0);
    }
    counter!("fleetops_rls_policy_violations_total").absolute(0);
    gauge!("fleetops_http_requests_in_flight").set(0.0);
}

pub fn record_fuel_event() {
    counter!("fleetops_fuel_events_total").increment(1);
}

pub fn record_anomaly_detected() {
    counter!("fleetops_fuel_anomalies_detected_total").increment(1);
}

pub fn record_anomaly_checked() {
    counter!("fleetops_fuel_anomalies_checked_total").increment(1);
}

pub fn record_limit_warning(window: &'static str) {
    counter!("fleetops_fuel_limit_warnings_total", "window" => window).increment(1);
}

/// Alert signal: a scope check in the application layer was bypassed
pub fn record_rls_violation() {
    counter!("fleetops_rls_policy_violations_total").increment(1);
}
