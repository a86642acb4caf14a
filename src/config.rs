// MIT License - Copyright (c) 2026 Peter Wright

use std::time::Duration;

use crate::constants::{
    DEFAULT_ACCESS_CODE, DEFAULT_ALARM_LIGHT_TIMEOUT, DEFAULT_BLINK_HALF_PERIOD,
    DEFAULT_ENTRY_DELAY, DEFAULT_EVENT_CAPACITY, DEFAULT_EXIT_DELAY, DEFAULT_KEY_SETTLE,
    DEFAULT_MAX_ATTEMPTS,
};
use crate::devices::code_entry::AccessCode;
use crate::error::{PanelError, Result};

/// Configuration for an alarm panel.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Stored access code, four digits (default: 1234)
    pub access_code: String,
    /// Wrong codes in Unset/Exit before the panel alarms (default: 3)
    pub max_attempts: u32,
    /// Time in Exit before the panel becomes fully set (default: 60s)
    pub exit_delay: Duration,
    /// Time in Entry allowed to enter a valid code (default: 120s)
    pub entry_delay: Duration,
    /// Time after which the alarm light goes out while still in Alarm (default: 120s)
    pub alarm_light_timeout: Duration,
    /// Indicator blink half period in Exit and Entry (default: 500ms)
    pub blink_half_period: Duration,
    /// Wait after each keypad scan to ride out contact bounce (default: 100ms)
    pub key_settle: Duration,
    /// Capacity of the panel event broadcast channel
    pub event_capacity: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            access_code: DEFAULT_ACCESS_CODE.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            exit_delay: DEFAULT_EXIT_DELAY,
            entry_delay: DEFAULT_ENTRY_DELAY,
            alarm_light_timeout: DEFAULT_ALARM_LIGHT_TIMEOUT,
            blink_half_period: DEFAULT_BLINK_HALF_PERIOD,
            key_settle: DEFAULT_KEY_SETTLE,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    /// Check the config and parse the stored access code.
    pub fn validate(&self) -> Result<AccessCode> {
        let code = AccessCode::parse(&self.access_code)?;
        if self.max_attempts == 0 {
            return Err(PanelError::InvalidConfig {
                details: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.blink_half_period.is_zero() {
            return Err(PanelError::InvalidConfig {
                details: "blink_half_period must be non-zero".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(PanelError::InvalidConfig {
                details: "event_capacity must be non-zero".to_string(),
            });
        }
        Ok(code)
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn access_code(mut self, code: impl Into<String>) -> Self {
        self.config.access_code = code.into();
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn exit_delay(mut self, delay: Duration) -> Self {
        self.config.exit_delay = delay;
        self
    }

    pub fn entry_delay(mut self, delay: Duration) -> Self {
        self.config.entry_delay = delay;
        self
    }

    pub fn alarm_light_timeout(mut self, timeout: Duration) -> Self {
        self.config.alarm_light_timeout = timeout;
        self
    }

    pub fn blink_half_period(mut self, period: Duration) -> Self {
        self.config.blink_half_period = period;
        self
    }

    pub fn key_settle(mut self, settle: Duration) -> Self {
        self.config.key_settle = settle;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}
