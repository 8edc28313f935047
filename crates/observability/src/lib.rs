use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide counters. Plain atomics, so callbacks never contend on a lock.
#[derive(Debug, Default)]
pub struct AppMetrics {
    callbacks_total: AtomicU64,
    gathers_issued_total: AtomicU64,
    invalid_input_total: AtomicU64,
    hangups_total: AtomicU64,
    record_lookups_total: AtomicU64,
    record_misses_total: AtomicU64,
    outbound_calls_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub callbacks_total: u64,
    pub gathers_issued_total: u64,
    pub invalid_input_total: u64,
    pub hangups_total: u64,
    pub record_lookups_total: u64,
    pub record_misses_total: u64,
    pub outbound_calls_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_callback(&self) {
        self.callbacks_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_gather(&self) {
        self.gathers_issued_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_input(&self) {
        self.invalid_input_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_hangup(&self) {
        self.hangups_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self, found: bool) {
        self.record_lookups_total.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.record_misses_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_outbound_call(&self) {
        self.outbound_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let callbacks = self.callbacks_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            callbacks_total: callbacks,
            gathers_issued_total: self.gathers_issued_total.load(Ordering::Relaxed),
            invalid_input_total: self.invalid_input_total.load(Ordering::Relaxed),
            hangups_total: self.hangups_total.load(Ordering::Relaxed),
            record_lookups_total: self.record_lookups_total.load(Ordering::Relaxed),
            record_misses_total: self.record_misses_total.load(Ordering::Relaxed),
            outbound_calls_total: self.outbound_calls_total.load(Ordering::Relaxed),
            avg_latency_millis: if callbacks == 0 {
                0.0
            } else {
                latency as f64 / callbacks as f64 / 1_000.0
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogSink {
    Stdout,
    Stderr,
}

pub fn init_tracing(service_name: &str) {
    install(service_name, LogSink::Stdout);
}

/// Same subscriber as `init_tracing`, written to stderr so stdout carries
/// only command output.
pub fn init_cli_tracing(service_name: &str) {
    install(service_name, LogSink::Stderr);
}

fn install(service_name: &str, sink: LogSink) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,ivr_api=info,ivr_agent=info,ivr_storage=info",
                service_name
            ))
        });

        let builder = tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true);

        match sink {
            LogSink::Stdout => builder.init(),
            LogSink::Stderr => builder.with_writer(std::io::stderr).init(),
        }
    });
}
