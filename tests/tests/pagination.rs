mod utils;
#[allow(unused)]
use utils::*;

use disputes_bench::constants::STATUS_CHECK;
use disputes_bench::prelude::*;
use mock_service::{MockConfig, Mode};
use tokio::time::Duration;

#[tokio::test]
async fn endless_cursor_stops_at_max_pages() {
    let (server, config) = setup(
        MockConfig {
            mode: Mode::Endless {
                cursor: "X".to_string(),
            },
            ..Default::default()
        },
        5,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 5);
    assert_eq!(registry.counter("pages_last_1d").get(), 5);

    let requests = server.requests();
    assert_eq!(requests.len(), 5);

    let first = requests[0].raw_query.as_deref().unwrap_or_default();
    assert!(!first.contains("cursor"), "first request carried a cursor: {first}");
    assert!(first.contains("limit=1000"));
    for request in &requests[1..] {
        assert_eq!(request.query.cursor.as_deref(), Some("X"));
        assert_eq!(request.query.limit, Some(1000));
    }
}

#[tokio::test]
async fn single_page_when_nothing_more() {
    let (server, config) = setup(
        MockConfig {
            total_events: 3,
            ..Default::default()
        },
        10,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 1);
    assert_eq!(server.requests().len(), 1);
    assert_eq!(registry.trend("page_last_1d_ms").samples().len(), 1);
    assert_eq!(registry.trend("flow_last_1d_total_ms").samples().len(), 1);
}

#[tokio::test]
async fn pages_through_dataset_with_server_cursors() {
    let (server, config) = setup(
        MockConfig {
            total_events: 2_500,
            ..Default::default()
        },
        10,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 3);

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].query.cursor.is_none());
    assert!(requests[1].query.cursor.is_some());
    assert_ne!(requests[1].query.cursor, requests[2].query.cursor);

    // Every page of one flow asks for the same window.
    for request in &requests[1..] {
        assert_eq!(request.query.time_from, requests[0].query.time_from);
        assert_eq!(request.query.time_to, requests[0].query.time_to);
    }
}

#[tokio::test]
async fn failed_status_still_follows_cursor() {
    let (server, config) = setup(
        MockConfig {
            total_events: 2_500,
            status_override: Some(mock_service::StatusCode::INTERNAL_SERVER_ERROR),
            ..Default::default()
        },
        10,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 3);
    assert_eq!(server.requests().len(), 3);

    let check = registry.check(STATUS_CHECK);
    assert_eq!(check.fails(), 3);
    assert_eq!(check.passes(), 0);
    assert_eq!(registry.counter("http_req_failed").get(), 3);
}

#[tokio::test]
async fn malformed_body_ends_flow() {
    let (server, config) = setup(
        MockConfig {
            mode: Mode::Malformed,
            ..Default::default()
        },
        10,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 1);
    assert_eq!(server.requests().len(), 1);
    assert_eq!(registry.check(STATUS_CHECK).passes(), 1);
}

#[tokio::test]
async fn rate_limited_pages_are_counted() {
    let (server, config) = setup(
        MockConfig {
            mode: Mode::Endless {
                cursor: "X".to_string(),
            },
            max_tps: std::num::NonZeroU32::new(1),
            ..Default::default()
        },
        3,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    // The first request gets through, the 503 that follows has no body and ends the flow.
    assert_eq!(result.pages, 2);
    assert_eq!(server.requests().len(), 2);
    assert_eq!(registry.check(STATUS_CHECK).fails(), 1);
}

#[tokio::test]
async fn server_latency_shows_in_page_time() {
    let (_server, config) = setup(
        MockConfig {
            total_events: 1,
            delay: Duration::from_millis(50),
            ..Default::default()
        },
        10,
    )
    .await;
    let registry = Registry::new();

    let result = single_flow(config, &registry).await;

    assert_eq!(result.pages, 1);
    assert!(result.total_ms >= 50.);
    assert!(registry.trend("page_last_1d_ms").samples()[0] >= 50.);
}
