mod utils;
#[allow(unused)]
use utils::*;

use disputes_bench::prelude::*;
use mock_service::MockConfig;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn both_scenarios_against_mock() {
    let (server, config) = setup(
        MockConfig {
            total_events: 2_500,
            delay: Duration::from_millis(2),
            ..Default::default()
        },
        10,
    )
    .await;

    let mut config = Arc::unwrap_or_clone(config);
    config.vus = NonZeroUsize::new(2).unwrap();
    config.duration = Duration::from_millis(500);
    let config = Arc::new(config);

    let registry = Registry::new();
    let client = Arc::new(HttpTransport::new(&config, &registry).unwrap());

    let summary = run(config, client, &registry).await;

    for shape in ["last_1d", "last_30d"] {
        let scenario = summary.scenarios.iter().find(|s| s.name == shape).unwrap();
        assert_eq!(scenario.vus, 2);
        assert!(scenario.iterations > 0);

        let flows = summary
            .trend(&format!("flow_{shape}_total_ms"))
            .and_then(|t| t.stats)
            .unwrap();
        let page = summary
            .trend(&format!("page_{shape}_ms"))
            .and_then(|t| t.stats)
            .unwrap();
        let pages = summary.counter(&format!("pages_{shape}")).unwrap();

        assert_eq!(flows.count as u64, scenario.iterations);
        assert_eq!(page.count as u64, scenario.iterations);
        // 2500 events at 1000 per page.
        assert_eq!(pages.total, 3 * scenario.iterations);
    }

    let total: u64 = summary.scenarios.iter().map(|s| s.iterations).sum();
    assert_eq!(server.requests().len() as u64, 3 * total);
    assert_eq!(summary.failed_checks(), 0);
}
