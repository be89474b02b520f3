use serde::{Deserialize, Serialize};

pub const DEFAULT_AI_CALL_LIMIT: u32 = 5;
pub const DEFAULT_QUOTA_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Persisted AI-call counter for the current quota window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub ai_calls: u32,
    pub last_reset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit: u32,
    pub window_ms: i64,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit: DEFAULT_AI_CALL_LIMIT,
            window_ms: DEFAULT_QUOTA_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub resets_at: i64,
}

impl UsageStats {
    pub fn fresh(now_ms: i64) -> Self {
        Self {
            ai_calls: 0,
            last_reset: now_ms,
        }
    }

    /// Returns the stats as they stand at `now_ms`, starting a new window when
    /// the previous one has strictly elapsed.
    pub fn rolled(self, now_ms: i64, policy: QuotaPolicy) -> Self {
        if now_ms - self.last_reset > policy.window_ms {
            Self::fresh(now_ms)
        } else {
            self
        }
    }

    /// Spends one unit if the window still has room. The window roll is kept
    /// even when the call is rejected.
    pub fn try_consume(&mut self, now_ms: i64, policy: QuotaPolicy) -> bool {
        *self = self.rolled(now_ms, policy);
        if self.ai_calls >= policy.limit {
            return false;
        }
        self.ai_calls += 1;
        true
    }

    pub fn status(self, now_ms: i64, policy: QuotaPolicy) -> QuotaStatus {
        let current = self.rolled(now_ms, policy);
        QuotaStatus {
            used: current.ai_calls,
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(current.ai_calls),
            resets_at: current.last_reset + policy.window_ms,
        }
    }
}
