//! Process-wide metrics sink.
//!
//! Every observation is kept in memory for the end-of-run summary and, with the `metrics`
//! feature, forwarded to the `metrics` facade so an installed exporter sees it as well.
use metrics_util::AtomicBucket;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};

/// Named trends, counters and checks. Handles are created on first use and shared afterwards,
/// so two callers asking for the same name append to the same series.
#[derive(Default)]
pub struct Registry {
    trends: RwLock<BTreeMap<String, Trend>>,
    counters: RwLock<BTreeMap<String, Counter>>,
    checks: RwLock<BTreeMap<String, Check>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trend(&self, name: &str) -> Trend {
        get_or_insert(&self.trends, name, || Trend::new(name))
    }

    pub fn counter(&self, name: &str) -> Counter {
        get_or_insert(&self.counters, name, || Counter::new(name))
    }

    pub fn check(&self, name: &str) -> Check {
        get_or_insert(&self.checks, name, || Check::new(name))
    }

    /// Registered trends, ordered by name.
    pub fn trends(&self) -> Vec<Trend> {
        values(&self.trends)
    }

    pub fn counters(&self) -> Vec<Counter> {
        values(&self.counters)
    }

    pub fn checks(&self) -> Vec<Check> {
        values(&self.checks)
    }
}

fn get_or_insert<T: Clone>(
    map: &RwLock<BTreeMap<String, T>>,
    name: &str,
    make: impl FnOnce() -> T,
) -> T {
    if let Some(existing) = map
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
    {
        return existing.clone();
    }

    map.write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(name.to_string())
        .or_insert_with(make)
        .clone()
}

fn values<T: Clone>(map: &RwLock<BTreeMap<String, T>>) -> Vec<T> {
    map.read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .cloned()
        .collect()
}

/// Series of numeric observations summarised with avg/median/percentiles at the end of a run.
#[derive(Clone)]
pub struct Trend {
    name: Arc<str>,
    samples: Arc<AtomicBucket<f64>>,
    #[cfg(feature = "metrics")]
    histogram: metrics::Histogram,
}

impl Trend {
    fn new(name: &str) -> Self {
        #[cfg(feature = "metrics")]
        metrics::describe_histogram!(name.to_string(), metrics::Unit::Milliseconds, "");

        Self {
            name: name.into(),
            samples: Arc::new(AtomicBucket::new()),
            #[cfg(feature = "metrics")]
            histogram: metrics::histogram!(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&self, value: f64) {
        self.samples.push(value);

        #[cfg(feature = "metrics")]
        self.histogram.record(value);
    }

    /// Copy of every observation recorded so far.
    pub fn samples(&self) -> Vec<f64> {
        self.samples.data()
    }
}

/// Monotonically increasing total.
#[derive(Clone)]
pub struct Counter {
    name: Arc<str>,
    value: Arc<AtomicU64>,
    #[cfg(feature = "metrics")]
    counter: metrics::Counter,
}

impl Counter {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(AtomicU64::new(0)),
            #[cfg(feature = "metrics")]
            counter: metrics::counter!(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn increment(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        self.counter.increment(value);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Pass/fail tally for an assertion that never aborts the caller.
#[derive(Clone)]
pub struct Check {
    name: Arc<str>,
    passes: Arc<AtomicU64>,
    fails: Arc<AtomicU64>,
    #[cfg(feature = "metrics")]
    pass_counter: metrics::Counter,
    #[cfg(feature = "metrics")]
    fail_counter: metrics::Counter,
}

impl Check {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            passes: Arc::new(AtomicU64::new(0)),
            fails: Arc::new(AtomicU64::new(0)),
            #[cfg(feature = "metrics")]
            pass_counter: metrics::counter!("checks", "check" => name.to_string(), "result" => "pass"),
            #[cfg(feature = "metrics")]
            fail_counter: metrics::counter!("checks", "check" => name.to_string(), "result" => "fail"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tallies the outcome and hands it back unchanged.
    pub fn record(&self, passed: bool) -> bool {
        if passed {
            self.passes.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            self.pass_counter.increment(1);
        } else {
            self.fails.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            self.fail_counter.increment(1);
        }
        passed
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn fails(&self) -> u64 {
        self.fails.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_shares_series() {
        let registry = Registry::new();
        registry.trend("page_last_1d_ms").add(12.5);
        registry.trend("page_last_1d_ms").add(7.5);
        registry.trend("page_last_30d_ms").add(100.);

        let mut samples = registry.trend("page_last_1d_ms").samples();
        samples.sort_by(f64::total_cmp);
        assert_eq!(samples, vec![7.5, 12.5]);
        assert_eq!(registry.trend("page_last_30d_ms").samples(), vec![100.]);
    }

    #[test]
    fn listing_is_sorted_by_name() {
        let registry = Registry::new();
        registry.counter("pages_last_30d");
        registry.counter("pages_last_1d").increment(3);

        let counters = registry.counters();
        let names: Vec<_> = counters.iter().map(Counter::name).collect();
        assert_eq!(names, vec!["pages_last_1d", "pages_last_30d"]);
        assert_eq!(counters[0].get(), 3);
        assert_eq!(counters[1].get(), 0);
    }

    #[test]
    fn check_tallies_and_passes_through() {
        let registry = Registry::new();
        let check = registry.check("status is 200");

        assert!(check.record(true));
        assert!(!check.record(false));
        assert!(!check.record(false));

        let check = registry.check("status is 200");
        assert_eq!(check.passes(), 1);
        assert_eq!(check.fails(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends() {
        let registry = Arc::new(Registry::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let trend = registry.trend("flow_last_1d_total_ms");
                let counter = registry.counter("pages_last_1d");
                for i in 0..500 {
                    trend.add(i as f64);
                    counter.increment(2);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.trend("flow_last_1d_total_ms").samples().len(), 4_000);
        assert_eq!(registry.counter("pages_last_1d").get(), 8_000);
    }
}
