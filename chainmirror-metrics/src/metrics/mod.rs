use std::sync::Once;

pub use prometheus::HistogramTimer;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry,
};
pub use types::{CacheLookup, LabelValue, Outcome};

mod types;

// -----------------
// Buckets
// -----------------
// Prometheus collects durations in seconds
const MILLIS_1_9: [f64; 9] = [
    0.001, 0.002, 0.003, 0.004, 0.005, 0.006, 0.007, 0.008, 0.009,
];
const MILLIS_10_90: [f64; 9] =
    [0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09];
const MILLIS_100_900: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
const SECONDS_1_9: [f64; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
const SECONDS_10_60: [f64; 6] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0];

lazy_static::lazy_static! {
    pub (crate) static ref REGISTRY: Registry = Registry::new_custom(Some("chainmirror".to_string()), None).unwrap();

    // -----------------
    // Rate Limiter
    // -----------------
    static ref LIMITER_QUEUE_DEPTH_GAUGE: IntGauge = IntGauge::new(
        "limiter_queue_depth", "Number of read calls waiting for admission",
    ).unwrap();

    static ref LIMITER_WINDOW_OCCUPANCY_GAUGE: IntGauge = IntGauge::new(
        "limiter_window_occupancy", "Admissions recorded inside the trailing window",
    ).unwrap();

    pub static ref LIMITER_ADMISSION_WAIT_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "limiter_admission_wait_seconds",
            "Time a request spent queued before it was admitted"
        )
        .buckets(
            MILLIS_1_9.iter().chain(
            MILLIS_10_90.iter()).chain(
            MILLIS_100_900.iter()).chain(
            SECONDS_1_9.iter()).chain(
            SECONDS_10_60.iter()).cloned().collect()
        ),
    ).unwrap();

    // -----------------
    // Read Calls
    // -----------------
    static ref READ_CALLS_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new("read_calls_count", "Count of external read calls by function and outcome"),
        &["function", "outcome"],
    ).unwrap();

    static ref READ_CALL_TIMEOUTS_COUNT: IntCounter = IntCounter::new(
        "read_call_timeouts_count", "Total number of read calls that did not settle in time",
    ).unwrap();

    pub static ref READ_CALL_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("read_call_duration_seconds", "Time spent waiting for a read call to settle")
            .buckets(
                MILLIS_1_9.iter().chain(
                MILLIS_10_90.iter()).chain(
                MILLIS_100_900.iter()).chain(
                SECONDS_1_9.iter()).cloned().collect()
            ),
        &["function"]
    ).unwrap();

    // -----------------
    // Cache
    // -----------------
    static ref CACHE_LOOKUPS_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new("cache_lookups_count", "Cache lookups by result"),
        &["result"],
    ).unwrap();

    // -----------------
    // Sync
    // -----------------
    static ref ENTITY_FETCH_FAILURES_COUNT: IntCounter = IntCounter::new(
        "entity_fetch_failures_count", "Entities that could not be assembled from the remote",
    ).unwrap();

    static ref ENTITY_REFRESHES_COUNT: IntCounter = IntCounter::new(
        "entity_refreshes_count", "Forced fresh reads of a single entity",
    ).unwrap();

    // -----------------
    // Transactions
    // -----------------
    static ref TRANSACTION_STATUS_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new("transaction_status_count", "Tracked transactions entering a status"),
        &["kind", "status"],
    ).unwrap();
}

pub(crate) fn register() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        macro_rules! register {
            ($collector:ident) => {
                REGISTRY
                    .register(Box::new($collector.clone()))
                    .expect("collector can't be registered");
            };
        }
        register!(LIMITER_QUEUE_DEPTH_GAUGE);
        register!(LIMITER_WINDOW_OCCUPANCY_GAUGE);
        register!(LIMITER_ADMISSION_WAIT_SECONDS);
        register!(READ_CALLS_COUNT);
        register!(READ_CALL_TIMEOUTS_COUNT);
        register!(READ_CALL_DURATION_SECONDS);
        register!(CACHE_LOOKUPS_COUNT);
        register!(ENTITY_FETCH_FAILURES_COUNT);
        register!(ENTITY_REFRESHES_COUNT);
        register!(TRANSACTION_STATUS_COUNT);
    });
}

pub fn set_limiter_queue_depth(count: usize) {
    LIMITER_QUEUE_DEPTH_GAUGE.set(count as i64);
}

pub fn set_limiter_window_occupancy(count: usize) {
    LIMITER_WINDOW_OCCUPANCY_GAUGE.set(count as i64);
}

pub fn observe_admission_wait(seconds: f64) {
    LIMITER_ADMISSION_WAIT_SECONDS.observe(seconds);
}

pub fn inc_read_call(function: &str, outcome: &impl LabelValue) {
    READ_CALLS_COUNT
        .with_label_values(&[function, outcome.value()])
        .inc();
}

pub fn inc_read_call_timeout() {
    READ_CALL_TIMEOUTS_COUNT.inc();
}

pub fn read_call_timer(function: &str) -> HistogramTimer {
    READ_CALL_DURATION_SECONDS
        .with_label_values(&[function])
        .start_timer()
}

pub fn inc_cache_lookup(lookup: &impl LabelValue) {
    CACHE_LOOKUPS_COUNT.with_label_values(&[lookup.value()]).inc();
}

pub fn inc_entity_fetch_failure() {
    ENTITY_FETCH_FAILURES_COUNT.inc();
}

pub fn inc_entity_refresh() {
    ENTITY_REFRESHES_COUNT.inc();
}

pub fn inc_transaction_status(kind: &str, status: &str) {
    TRANSACTION_STATUS_COUNT
        .with_label_values(&[kind, status])
        .inc();
}

/// Renders every registered collector in the prometheus text format.
pub fn encode_registry() -> String {
    prometheus::TextEncoder::new()
        .encode_to_string(&REGISTRY.gather())
        .unwrap_or_else(|err| {
            log::warn!("Failed to encode metrics: {:?}", err);
            String::new()
        })
}
