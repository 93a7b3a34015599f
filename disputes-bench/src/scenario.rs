//! Constant virtual-user scenario runner
use crate::config::ScenarioConfig;
use std::{
    fmt,
    future::Future,
    num::NonZeroUsize,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, info_span, instrument, trace, warn, Instrument};

/// Load test scenario structure
///
/// Runs `func` from a fixed pool of virtual users for a fixed wall-clock duration. Awaiting the
/// scenario starts it.
///
/// # Example
/// ```no_run
/// use disputes_bench::scenario::{ConfigurableScenario, Scenario};
/// use std::num::NonZeroUsize;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let stats = Scenario::new("idle", || async {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///     })
///     .vus(NonZeroUsize::new(4).unwrap())
///     .duration(Duration::from_secs(5))
///     .await;
///
///     println!("{stats}");
/// }
/// ```
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunStatistics> + Send>>>,
    config: ScenarioConfig,
}

impl<T> Scenario<T> {
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
        }
    }

    pub fn with_config(config: ScenarioConfig, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config,
        }
    }
}

impl<T, F> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = RunStatistics;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.runner_fut.is_none() {
            let func = self.func.clone();
            let config = self.config.clone();
            self.runner_fut = Some(Box::pin(async move { run_scenario(func, config).await }));
        }

        if let Some(runner) = &mut self.runner_fut {
            runner.as_mut().poll(cx)
        } else {
            unreachable!()
        }
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn vus(self, vus: NonZeroUsize) -> Self;
    fn duration(self, duration: Duration) -> Self;
}

impl<T, F> ConfigurableScenario<RunStatistics> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    /// Number of virtual users looping over the scenario function concurrently.
    fn vus(mut self, vus: NonZeroUsize) -> Self {
        self.config.vus = vus;
        self
    }

    /// How long new iterations keep being started. Iterations already running when the time is
    /// up are allowed to finish.
    fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = duration;
        self
    }
}

/// What a finished scenario did.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    pub name: String,
    pub vus: usize,
    pub iterations: u64,
    pub elapsed: Duration,
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} VUs, {} complete iterations in {}",
            self.name,
            self.vus,
            self.iterations,
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64)),
        )
    }
}

#[instrument(name = "scenario", skip_all, fields(name = config.name))]
pub(crate) async fn run_scenario<T, F>(scenario: T, config: ScenarioConfig) -> RunStatistics
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    info!("Running {} with config {:?}", config.name, &config);

    let start = Instant::now();
    let deadline = start + config.duration;
    let iterations = Arc::new(AtomicU64::new(0));

    let mut tasks = Vec::with_capacity(config.vus.get());
    for vu in 1..=config.vus.get() {
        let scenario = scenario.clone();
        let iterations = iterations.clone();

        tasks.push(tokio::spawn(
            async move {
                // NOTE: The deadline is only checked between iterations so an in-flight flow is
                // never cut short.
                while Instant::now() < deadline {
                    scenario().await;
                    iterations.fetch_add(1, Ordering::Relaxed);
                }
            }
            .instrument(info_span!("vu", id = vu)),
        ));
    }

    for task in tasks {
        if let Err(err) = task.await {
            error!("Virtual user stopped unexpectedly: {err}");
        }
    }

    let stats = RunStatistics {
        name: config.name.clone(),
        vus: config.vus.get(),
        iterations: iterations.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };

    info!("Scenario complete: {stats}");

    stats
}
