use std::sync::Arc;

use pixatools_domain::{QuotaPolicy, QuotaStatus, UsageStats};

use crate::{ApplicationError, Clock, StateStore, StoreWrite};

pub const USAGE_KEY: &str = "usage";

/// Daily AI-call limiter. Every admission check spends a unit; use
/// [`RateGate::status`] to look without spending.
pub struct RateGate {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    policy: QuotaPolicy,
}

impl RateGate {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>, policy: QuotaPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    pub fn try_consume(&self) -> Result<bool, ApplicationError> {
        let now = self.clock.now_millis();
        let policy = self.policy;
        let mut admitted = false;

        self.store.update(USAGE_KEY, &mut |current| {
            let mut stats = decode_usage(current.as_deref())?.unwrap_or(UsageStats::fresh(now));
            admitted = stats.try_consume(now, policy);
            if !admitted {
                return Ok(StoreWrite::Keep);
            }
            encode_usage(&stats).map(StoreWrite::Put)
        })?;

        if admitted {
            tracing::debug!(limit = policy.limit, "ai call admitted");
        } else {
            tracing::info!(limit = policy.limit, "ai call rejected, quota exhausted");
        }
        Ok(admitted)
    }

    pub fn status(&self) -> Result<QuotaStatus, ApplicationError> {
        let now = self.clock.now_millis();
        let stored = self.store.get(USAGE_KEY)?;
        let stats = decode_usage(stored.as_deref())?.unwrap_or(UsageStats::fresh(now));
        Ok(stats.status(now, self.policy))
    }
}

fn decode_usage(raw: Option<&str>) -> Result<Option<UsageStats>, ApplicationError> {
    raw.map(serde_json::from_str::<UsageStats>)
        .transpose()
        .map_err(|error| ApplicationError::Persistence(format!("corrupt usage record: {error}")))
}

fn encode_usage(stats: &UsageStats) -> Result<String, ApplicationError> {
    serde_json::to_string(stats).map_err(|error| ApplicationError::Persistence(error.to_string()))
}
