use pdatastructs::tdigest::{TDigest, K1};
use std::fmt;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Aggregate view over the samples of a single trend. All values share the trend's unit
/// (milliseconds for every trend this crate records).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendStats {
    pub avg: f64,
    pub min: f64,
    pub med: f64,
    pub max: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: usize,
}

impl TrendStats {
    /// `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut digest = default_tdigest();
        for value in &sorted {
            digest.insert(*value);
        }

        Some(Self {
            avg: statistical::mean(&sorted),
            min: sorted[0],
            med: statistical::median(&sorted),
            max: sorted[sorted.len() - 1],
            p90: digest.quantile(0.90),
            p95: digest.quantile(0.95),
            p99: digest.quantile(0.99),
            count: sorted.len(),
        })
    }
}

impl fmt::Display for TrendStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "avg={} med={} p(95)={} p(99)={} count={}",
            Millis(self.avg),
            Millis(self.med),
            Millis(self.p95),
            Millis(self.p99),
            self.count,
        )
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

/// Millisecond value rendered with a unit that keeps it readable.
pub(crate) struct Millis(pub f64);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.0;
        if ms >= 60_000. {
            let minutes = (ms / 60_000.).floor();
            write!(f, "{}m{:.2}s", minutes, (ms - minutes * 60_000.) / 1_000.)
        } else if ms >= 1_000. {
            write!(f, "{:.2}s", ms / 1_000.)
        } else if ms >= 1. || ms == 0. {
            write!(f, "{:.2}ms", ms)
        } else {
            write!(f, "{:.2}µs", ms * 1_000.)
        }
    }
}
