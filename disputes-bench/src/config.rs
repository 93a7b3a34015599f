use crate::constants::*;
use crate::error::BenchError;
use clap::Parser;
use std::net::SocketAddr;
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;
use url::Url;

/// Command line and environment options.
///
/// Every option can be given either as a long flag or through the environment variable of the
/// same name, so the usual invocation is simply `BASE_URL=... VUS=8 disputes-bench`.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Load generator for the paginated disputes events API")]
pub struct BenchArgs {
    /// Root URL of the target server
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Page size requested on every call
    #[arg(long, env = "LIMIT", default_value_t = DEFAULT_LIMIT)]
    pub limit: NonZeroU32,

    /// Concurrent virtual users per scenario
    #[arg(long, env = "VUS", default_value_t = DEFAULT_VUS)]
    pub vus: NonZeroUsize,

    /// Wall-clock run length per scenario (e.g. `20s`, `1m30s`)
    #[arg(long, env = "DURATION", default_value = "20s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Upper bound on pages fetched in a single flow
    #[arg(long, env = "MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: NonZeroU32,

    /// Per-request timeout
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "60s", value_parser = humantime::parse_duration)]
    pub request_timeout: Duration,

    /// Serve Prometheus metrics on this address while the run is in progress
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

/// Validated run configuration. Built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub limit: NonZeroU32,
    pub vus: NonZeroUsize,
    pub duration: Duration,
    pub max_pages: NonZeroU32,
    pub request_timeout: Duration,
    pub metrics_addr: Option<SocketAddr>,
    events_url: Url,
}

impl Config {
    /// Configuration with every option at its default except the target.
    pub fn new(base_url: &str) -> Result<Self, BenchError> {
        let base_url = parse_base_url(base_url)?;
        let events_url = events_url(&base_url);
        Ok(Self {
            base_url,
            limit: DEFAULT_LIMIT,
            vus: DEFAULT_VUS,
            duration: DEFAULT_DURATION,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            metrics_addr: None,
            events_url,
        })
    }

    pub fn from_args(args: BenchArgs) -> Result<Self, BenchError> {
        let mut config = Self::new(&args.base_url)?;
        config.limit = args.limit;
        config.vus = args.vus;
        config.duration = args.duration;
        config.max_pages = args.max_pages;
        config.request_timeout = args.request_timeout;
        config.metrics_addr = args.metrics_addr;
        Ok(config)
    }

    /// `{base_url}/disputes/events`, without a query string.
    pub fn events_url(&self) -> &Url {
        &self.events_url
    }

    pub fn scenario(&self, name: &str) -> ScenarioConfig {
        ScenarioConfig {
            name: name.to_string(),
            vus: self.vus,
            duration: self.duration,
        }
    }
}

impl TryFrom<BenchArgs> for Config {
    type Error = BenchError;

    fn try_from(args: BenchArgs) -> Result<Self, Self::Error> {
        Self::from_args(args)
    }
}

#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub name: String,
    pub vus: NonZeroUsize,
    pub duration: Duration,
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            vus: DEFAULT_VUS,
            duration: DEFAULT_DURATION,
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, BenchError> {
    let url = Url::parse(raw).map_err(|source| BenchError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(BenchError::UnsupportedScheme(raw.to_string())),
    }
}

fn events_url(base_url: &Url) -> Url {
    let mut url = base_url.clone();
    let path = format!("{}/{}", base_url.path().trim_end_matches('/'), EVENTS_PATH);
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    url
}
