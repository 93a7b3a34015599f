#![doc = include_str!("../README.md")]

pub mod bench;
pub mod config;
pub mod constants;
pub mod error;
pub mod flow;
pub mod pagination;
pub mod report;
pub mod scenario;
pub mod sink;
pub mod stats;
pub mod time_range;
pub mod transport;

pub use config::{BenchArgs, Config};
pub use error::BenchError;
pub use report::Summary;
pub use sink::Registry;

pub mod prelude {
    pub use crate::bench::run;
    pub use crate::config::{BenchArgs, Config};
    pub use crate::flow::{Flow, FlowShape, LAST_1D, LAST_30D};
    pub use crate::pagination::{traverse, FlowResult};
    pub use crate::scenario::{ConfigurableScenario, RunStatistics, Scenario};
    pub use crate::sink::Registry;
    pub use crate::time_range::TimeRange;
    pub use crate::transport::{HttpTransport, Transport};
}
