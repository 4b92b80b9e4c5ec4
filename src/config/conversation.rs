//! Conversation engine timing configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeouts and housekeeping intervals for the conversation engine
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_media_timeout")]
    pub media_timeout_secs: u64,

    #[serde(default = "default_completion_timeout")]
    pub completion_timeout_secs: u64,

    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_secs: u64,

    /// How long a per-user worker waits for the next event before exiting
    #[serde(default = "default_worker_idle")]
    pub worker_idle_secs: u64,

    /// Sessions idle longer than this are evicted; 0 keeps them forever
    #[serde(default = "default_session_idle_ttl")]
    pub session_idle_ttl_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl ConversationConfig {
    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn worker_idle(&self) -> Duration {
        Duration::from_secs(self.worker_idle_secs)
    }

    /// Idle TTL for sessions, `None` when eviction is disabled
    pub fn session_idle_ttl(&self) -> Option<Duration> {
        (self.session_idle_ttl_secs > 0).then(|| Duration::from_secs(self.session_idle_ttl_secs))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Validate conversation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_stage_timeout(self.media_timeout_secs, "media")?;
        check_stage_timeout(self.completion_timeout_secs, "completion")?;
        check_stage_timeout(self.notify_timeout_secs, "notify")?;
        if self.worker_idle_secs == 0 {
            return Err(ValidationError::InvalidWorkerIdle);
        }
        if self.session_idle_ttl_secs > 0 && self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

fn check_stage_timeout(secs: u64, stage: &'static str) -> Result<(), ValidationError> {
    if secs == 0 || secs > 300 {
        return Err(ValidationError::InvalidStageTimeout(stage));
    }
    Ok(())
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            media_timeout_secs: default_media_timeout(),
            completion_timeout_secs: default_completion_timeout(),
            notify_timeout_secs: default_notify_timeout(),
            worker_idle_secs: default_worker_idle(),
            session_idle_ttl_secs: default_session_idle_ttl(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_media_timeout() -> u64 {
    15
}

fn default_completion_timeout() -> u64 {
    30
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_worker_idle() -> u64 {
    300
}

fn default_session_idle_ttl() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    600
}
