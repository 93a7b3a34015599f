use crate::config::Config;
use crate::constants::STATUS_CHECK;
use crate::pagination::{traverse, FlowResult};
use crate::sink::{Check, Counter, Registry, Trend};
use crate::time_range::TimeRange;
use crate::transport::Transport;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Query shape driven by one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowShape {
    pub name: &'static str,
    pub days: u32,
}

pub const LAST_1D: FlowShape = FlowShape {
    name: "last_1d",
    days: 1,
};

pub const LAST_30D: FlowShape = FlowShape {
    name: "last_30d",
    days: 30,
};

/// Series a flow reports into. Each shape gets its own three names.
#[derive(Clone)]
pub struct FlowMetrics {
    pub page: Trend,
    pub flow_total: Trend,
    pub pages: Counter,
}

impl FlowMetrics {
    pub fn register(registry: &Registry, shape: &FlowShape) -> Self {
        Self {
            page: registry.trend(&format!("page_{}_ms", shape.name)),
            flow_total: registry.trend(&format!("flow_{}_total_ms", shape.name)),
            pages: registry.counter(&format!("pages_{}", shape.name)),
        }
    }

    pub fn record(&self, result: &FlowResult) {
        self.page.add(result.page_avg_ms());
        self.flow_total.add(result.total_ms);
        self.pages.increment(u64::from(result.pages));
    }
}

/// Everything a virtual user needs to run one shape's flow. Cheap to clone.
pub struct Flow<C> {
    shape: FlowShape,
    metrics: FlowMetrics,
    status_check: Check,
    config: Arc<Config>,
    client: Arc<C>,
}

impl<C> Clone for Flow<C> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape,
            metrics: self.metrics.clone(),
            status_check: self.status_check.clone(),
            config: self.config.clone(),
            client: self.client.clone(),
        }
    }
}

impl<C: Transport> Flow<C> {
    pub fn new(shape: FlowShape, config: Arc<Config>, client: Arc<C>, registry: &Registry) -> Self {
        Self {
            shape,
            metrics: FlowMetrics::register(registry, &shape),
            status_check: registry.check(STATUS_CHECK),
            config,
            client,
        }
    }

    pub fn shape(&self) -> FlowShape {
        self.shape
    }

    /// One sweep over the last `days` days, reported as a per-page average, a flow total and a
    /// page count. The window is computed on every call.
    ///
    /// Returns `None` only if the window could not be rendered, in which case nothing is
    /// requested or recorded.
    pub async fn run(&self) -> Option<FlowResult> {
        let range = match TimeRange::last_days(self.shape.days) {
            Ok(range) => range,
            Err(err) => {
                error!("Unable to build the {} window: {err}", self.shape.name);
                return None;
            }
        };

        let result = traverse(&*self.client, &self.status_check, &range, &self.config).await;
        self.metrics.record(&result);

        debug!(
            "{} flow: {} pages in {:.2}ms",
            self.shape.name, result.pages, result.total_ms
        );

        Some(result)
    }
}
