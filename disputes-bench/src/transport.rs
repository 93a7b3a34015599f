use crate::config::Config;
use crate::error::BenchError;
use crate::sink::{Counter, Registry, Trend};
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::time::{Duration, Instant};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use url::Url;

/// One request/response pair as seen by the traversal.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// `None` when the request never produced a response.
    pub status: Option<StatusCode>,
    /// `None` on transport failure or when the body could not be read.
    pub body: Option<Bytes>,
    pub duration: Duration,
}

impl Exchange {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_nanos() as f64 / 1e6
    }
}

/// Issues GET requests on behalf of a flow. Failures never surface as errors; they come back
/// as an [`Exchange`] with the missing parts left empty.
pub trait Transport: Send + Sync {
    fn get(&self, url: Url) -> impl Future<Output = Exchange> + Send;
}

/// `reqwest` backed transport recording the built-in request series.
pub struct HttpTransport {
    client: Client,
    req_duration: Trend,
    reqs: Counter,
    req_failed: Counter,
}

impl HttpTransport {
    pub fn new(config: &Config, registry: &Registry) -> Result<Self, BenchError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            req_duration: registry.trend("http_req_duration"),
            reqs: registry.counter("http_reqs"),
            req_failed: registry.counter("http_req_failed"),
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: Url) -> impl Future<Output = Exchange> + Send {
        async move {
            trace!("GET {url}");
            let start = Instant::now();

            let (status, body) = match self.client.get(url).send().await {
                Ok(res) => {
                    let status = res.status();
                    match res.bytes().await {
                        Ok(body) => (Some(status), Some(body)),
                        Err(err) => {
                            debug!("Failed reading response body: {err}");
                            (Some(status), None)
                        }
                    }
                }
                Err(err) => {
                    debug!("Request failed: {err}");
                    (None, None)
                }
            };

            let exchange = Exchange {
                status,
                body,
                duration: start.elapsed(),
            };

            self.reqs.increment(1);
            self.req_duration.add(exchange.duration_ms());
            if !status.is_some_and(|s| s.is_success() || s.is_redirection()) {
                self.req_failed.increment(1);
            }

            exchange
        }
    }
}
