//! End-of-run summary.
use crate::scenario::RunStatistics;
use crate::sink::Registry;
use crate::stats::TrendStats;
use std::fmt;
use std::time::Duration;

const NAME_WIDTH: usize = 32;

#[derive(Debug, Clone)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckSummary {
    pub fn pass_rate(&self) -> f64 {
        let total = self.passes + self.fails;
        if total == 0 {
            0.
        } else {
            self.passes as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendSummary {
    pub name: String,
    pub stats: Option<TrendStats>,
}

#[derive(Debug, Clone)]
pub struct CounterSummary {
    pub name: String,
    pub total: u64,
    /// Per second of run time.
    pub rate: f64,
}

/// Snapshot of every registered series plus the scenarios that fed them.
#[derive(Debug, Clone)]
pub struct Summary {
    pub checks: Vec<CheckSummary>,
    pub trends: Vec<TrendSummary>,
    pub counters: Vec<CounterSummary>,
    pub scenarios: Vec<RunStatistics>,
    pub elapsed: Duration,
}

impl Summary {
    pub fn collect(registry: &Registry, scenarios: Vec<RunStatistics>, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();

        let checks = registry
            .checks()
            .into_iter()
            .map(|check| CheckSummary {
                name: check.name().to_string(),
                passes: check.passes(),
                fails: check.fails(),
            })
            .collect();

        let trends = registry
            .trends()
            .into_iter()
            .map(|trend| TrendSummary {
                name: trend.name().to_string(),
                stats: TrendStats::from_values(&trend.samples()),
            })
            .collect();

        let counters = registry
            .counters()
            .into_iter()
            .map(|counter| {
                let total = counter.get();
                CounterSummary {
                    name: counter.name().to_string(),
                    total,
                    rate: if secs > 0. { total as f64 / secs } else { 0. },
                }
            })
            .collect();

        Self {
            checks,
            trends,
            counters,
            scenarios,
            elapsed,
        }
    }

    pub fn trend(&self, name: &str) -> Option<&TrendSummary> {
        self.trends.iter().find(|t| t.name == name)
    }

    pub fn counter(&self, name: &str) -> Option<&CounterSummary> {
        self.counters.iter().find(|c| c.name == name)
    }

    /// Total failed checks over the run.
    pub fn failed_checks(&self) -> u64 {
        self.checks.iter().map(|c| c.fails).sum()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(
                f,
                "     {}: {:.2}% ✓ {} ✗ {}",
                dotted(&format!("checks{{{}}}", check.name)),
                check.pass_rate() * 100.,
                check.passes,
                check.fails,
            )?;
        }

        for trend in &self.trends {
            match &trend.stats {
                Some(stats) => writeln!(f, "     {}: {stats}", dotted(&trend.name))?,
                None => writeln!(f, "     {}: no samples", dotted(&trend.name))?,
            }
        }

        for counter in &self.counters {
            writeln!(
                f,
                "     {}: {} {:.2}/s",
                dotted(&counter.name),
                counter.total,
                counter.rate,
            )?;
        }

        writeln!(f)?;
        for scenario in &self.scenarios {
            writeln!(f, "     {scenario}")?;
        }

        Ok(())
    }
}

fn dotted(name: &str) -> String {
    if name.len() >= NAME_WIDTH {
        name.to_string()
    } else {
        format!("{name}{}", ".".repeat(NAME_WIDTH - name.len()))
    }
}
