//! Background triggers and the scheduler that drives them.

pub mod match_poller;
pub mod match_simulation;
mod pool_metrics;
pub mod scheduler;

pub use match_poller::MatchPollerJob;
pub use match_simulation::MatchSimulationJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
