//! PostgreSQL pool occupancy gauges and saturation logging.

use metrics::gauge;
use sqlx::PgPool;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use super::scheduler::{Job, JobFrequency};

pub const POOL_METRICS_INTERVAL_SECS: u64 = 10;

/// One reading of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSample {
    pub open: u32,
    pub idle: u32,
    pub max: u32,
}

impl PoolSample {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            open: pool.size(),
            idle: u32::try_from(pool.num_idle()).unwrap_or(u32::MAX),
            max: pool.options().get_max_connections(),
        }
    }

    pub fn in_use(&self) -> u32 {
        self.open.saturating_sub(self.idle)
    }

    /// Share of the ceiling checked out, 0.0 for a pool without one.
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        f64::from(self.in_use()) / f64::from(self.max)
    }

    pub fn is_saturated(&self) -> bool {
        self.max > 0 && self.in_use() >= self.max
    }

    fn record(&self) {
        gauge!("db_pool_connections", "state" => "in_use").set(f64::from(self.in_use()));
        gauge!("db_pool_connections", "state" => "idle").set(f64::from(self.idle));
        gauge!("db_pool_max_connections").set(f64::from(self.max));
        gauge!("db_pool_utilization_ratio").set(self.utilization());
    }
}

pub struct PoolMetricsJob {
    pool: PgPool,
    saturated: AtomicBool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            saturated: AtomicBool::new(false),
        }
    }

    /// Records the sample and logs when the pool enters or leaves saturation.
    fn observe(&self, sample: PoolSample) {
        sample.record();
        let now = sample.is_saturated();
        if self.saturated.swap(now, Ordering::Relaxed) == now {
            return;
        }
        if now {
            warn!(max = sample.max, "Database pool saturated");
        } else {
            info!(in_use = sample.in_use(), max = sample.max, "Database pool recovered");
        }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(POOL_METRICS_INTERVAL_SECS)
    }

    async fn execute(&self) -> Result<(), String> {
        self.observe(PoolSample::of(&self.pool));
        Ok(())
    }
}
