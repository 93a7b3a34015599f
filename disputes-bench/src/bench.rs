//! Wires the two flow shapes into concurrently running scenarios.
use crate::config::Config;
use crate::error::BenchError;
use crate::flow::{Flow, LAST_1D, LAST_30D};
use crate::report::Summary;
use crate::scenario::{RunStatistics, Scenario};
use crate::sink::Registry;
use crate::transport::Transport;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Run the `last_1d` and `last_30d` scenarios side by side and summarise what they recorded.
pub async fn run<C>(config: Arc<Config>, client: Arc<C>, registry: &Registry) -> Summary
where
    C: Transport + 'static,
{
    let start = Instant::now();

    let last_1d = Flow::new(LAST_1D, config.clone(), client.clone(), registry);
    let last_30d = Flow::new(LAST_30D, config.clone(), client, registry);

    let (last_1d, last_30d) = tokio::join!(
        flow_scenario(last_1d, &config),
        flow_scenario(last_30d, &config),
    );

    Summary::collect(registry, vec![last_1d, last_30d], start.elapsed())
}

fn flow_scenario<C>(flow: Flow<C>, config: &Config) -> impl Future<Output = RunStatistics>
where
    C: Transport + 'static,
{
    let scenario = config.scenario(flow.shape().name);
    Scenario::with_config(scenario, move || {
        let flow = flow.clone();
        async move {
            flow.run().await;
        }
    })
}

/// Expose everything recorded through the `metrics` facade on `addr` in Prometheus format.
/// Must run inside the tokio runtime and before the registry hands out any series.
#[cfg(feature = "metrics")]
pub fn install_prometheus(addr: SocketAddr) -> Result<(), BenchError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Serving Prometheus metrics on {addr}");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
pub fn install_prometheus(addr: SocketAddr) -> Result<(), BenchError> {
    warn!("Built without the `metrics` feature; not serving metrics on {addr}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STATUS_CHECK;
    use crate::transport::tests::{json, ScriptedTransport};
    use serde_json::json;
    use std::num::NonZeroUsize;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn both_shapes_report_separately() {
        let mut config = Config::new("http://localhost:3000").unwrap();
        config.vus = NonZeroUsize::new(2).unwrap();
        config.duration = Duration::from_millis(100);

        let registry = Registry::new();
        let transport = Arc::new(ScriptedTransport::new(|i, _| {
            if i % 2 == 0 {
                json(200, json!({ "has_more": true, "next_cursor": "more" }), 5)
            } else {
                json(200, json!({ "has_more": false }), 5)
            }
        }));

        let summary = run(Arc::new(config), transport, &registry).await;

        assert_eq!(summary.scenarios.len(), 2);
        assert_eq!(summary.scenarios[0].name, "last_1d");
        assert_eq!(summary.scenarios[1].name, "last_30d");

        for shape in ["last_1d", "last_30d"] {
            let flows = summary
                .trend(&format!("flow_{shape}_total_ms"))
                .and_then(|t| t.stats)
                .unwrap();
            let pages = summary.counter(&format!("pages_{shape}")).unwrap();
            let scenario = summary.scenarios.iter().find(|s| s.name == shape).unwrap();

            assert_eq!(flows.count as u64, scenario.iterations);
            assert!(pages.total >= scenario.iterations);
        }

        let check = summary.checks.iter().find(|c| c.name == STATUS_CHECK).unwrap();
        assert_eq!(check.fails, 0);
        assert!(check.passes > 0);
    }
}
