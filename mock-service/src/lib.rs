use axum::{
    debug_handler,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
pub use axum::http::StatusCode;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 1000;

const EVENT_KINDS: [&str; 5] = [
    "webhook_opened",
    "webhook_updated",
    "provider_decision",
    "evidence_submitted",
    "evidence_added",
];

/// How the events endpoint answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Page through `total_events` synthetic events.
    Paged,
    /// Always `has_more: true` with the same cursor.
    Endless { cursor: String },
    /// A body that is not JSON.
    Malformed,
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub total_events: usize,
    pub mode: Mode,
    /// Status sent instead of 200. The body is unchanged.
    pub status_override: Option<StatusCode>,
    /// Requests above this rate get an empty 503.
    pub max_tps: Option<NonZeroU32>,
    pub delay: Duration,
    /// Standard deviation of a normal distribution around `delay`.
    pub jitter: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            total_events: 2_500,
            mode: Mode::Paged,
            status_override: None,
            max_tps: None,
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventsQuery {
    pub limit: Option<usize>,
    pub time_from: Option<String>,
    pub time_to: Option<String>,
    pub cursor: Option<String>,
}

/// A request as it reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub query: EventsQuery,
    pub raw_query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisputeEvent {
    pub event_id: String,
    pub dispute_id: String,
    pub kind: &'static str,
    pub provider_event_id: String,
    pub data: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub items: Vec<DisputeEvent>,
    pub next_cursor: String,
    pub has_more: bool,
}

pub struct MockState {
    config: MockConfig,
    limiter: Option<DefaultDirectRateLimiter>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            limiter: config.max_tps.map(rate_limiter),
            config,
            requests: Mutex::new(vec![]),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn latency(&self) -> Duration {
        let MockConfig { delay, jitter, .. } = self.config;
        if jitter.is_zero() {
            return delay;
        }

        match Normal::new(delay.as_secs_f64(), jitter.as_secs_f64()) {
            Ok(normal) => Duration::from_secs_f64(normal.sample(&mut rand::thread_rng()).max(0.)),
            Err(_) => delay,
        }
    }
}

/// Running mock bound to an ephemeral port.
pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests()
    }
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/disputes/events", get(events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(addr: SocketAddr, config: MockConfig) -> anyhow::Result<()> {
    let app = router(Arc::new(MockState::new(config)));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Serve `config` on `127.0.0.1` in a background task.
pub async fn spawn(config: MockConfig) -> anyhow::Result<MockServer> {
    let state = Arc::new(MockState::new(config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let app = router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    Ok(MockServer { addr, state })
}

#[debug_handler]
pub async fn events(
    State(state): State<Arc<MockState>>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<EventsQuery>,
) -> Response {
    counter!("mock_service.requests").increment(1);
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            query: query.clone(),
            raw_query,
        });

    tokio::time::sleep(state.latency()).await;

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!("MOCK SERVER ___ OVER CAPACITY");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    let status = state.config.status_override.unwrap_or(StatusCode::OK);

    let body = match &state.config.mode {
        Mode::Malformed => return (status, "<html>upstream error</html>").into_response(),
        Mode::Endless { cursor } => EventPage {
            items: vec![],
            next_cursor: cursor.clone(),
            has_more: true,
        },
        Mode::Paged => match page(state.config.total_events, &query) {
            Some(body) => body,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "invalid cursor" })),
                )
                    .into_response()
            }
        },
    };

    (status, Json(body)).into_response()
}

/// Page of the synthetic dataset. `None` for a cursor this server never handed out.
pub fn page(total_events: usize, query: &EventsQuery) -> Option<EventPage> {
    let limit = match query.limit {
        Some(limit) if limit > 0 => limit.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    };

    let offset = match query.cursor.as_deref() {
        None | Some("") => 0,
        Some(cursor) => decode_cursor(cursor)?,
    };

    let start = offset.min(total_events);
    let end = (start + limit).min(total_events);
    let created_at = query.time_to.clone().unwrap_or_default();

    let items = (start..end)
        .map(|i| DisputeEvent {
            event_id: format!("evt-{i}"),
            dispute_id: format!("dsp-{}", i / EVENT_KINDS.len()),
            kind: EVENT_KINDS[i % EVENT_KINDS.len()],
            provider_event_id: format!("prv-{i}"),
            data: serde_json::json!({}),
            created_at: created_at.clone(),
        })
        .collect();

    let has_more = end < total_events;
    Some(EventPage {
        items,
        next_cursor: if has_more {
            encode_cursor(end)
        } else {
            String::new()
        },
        has_more,
    })
}

fn encode_cursor(offset: usize) -> String {
    format!("evt_{offset:08x}")
}

fn decode_cursor(cursor: &str) -> Option<usize> {
    usize::from_str_radix(cursor.strip_prefix("evt_")?, 16).ok()
}

/** Utils **/

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}

/** TPS Printer **/

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let requests = TPS_MEASURE.swap(0, Ordering::Relaxed);
        if requests > 0 {
            println!("{requests} TPS");
        }
    }
}
