use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability queries answered. Labels: query, zone.
pub const QUERIES_TOTAL: &str = "bliss_availability_queries_total";

/// Histogram: time spent answering an availability query in seconds. Labels: query.
pub const QUERY_DURATION_SECONDS: &str = "bliss_availability_query_duration_seconds";

/// Counter: bookings written. Labels: zone, channel.
pub const BOOKINGS_CREATED_TOTAL: &str = "bliss_bookings_created_total";

/// Counter: submissions rejected because the slot filled up in the meantime. Labels: zone.
pub const SLOT_CONFLICTS_TOTAL: &str = "bliss_slot_conflicts_total";

/// Counter: booking status changes. Labels: status.
pub const STATUS_CHANGES_TOTAL: &str = "bliss_booking_status_changes_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: resolved capacity at the last lookup. Labels: zone.
pub const ZONE_CAPACITY: &str = "bliss_zone_capacity";

/// Histogram: journal group-commit flush duration in seconds.
pub const JOURNAL_FLUSH_DURATION_SECONDS: &str = "bliss_journal_flush_duration_seconds";

/// Histogram: journal group-commit batch size (records per flush).
pub const JOURNAL_FLUSH_BATCH_SIZE: &str = "bliss_journal_flush_batch_size";

/// Counter: journal compactions run.
pub const JOURNAL_COMPACTIONS_TOTAL: &str = "bliss_journal_compactions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}
