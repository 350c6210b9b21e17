//! Runtime configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Volume change per up/down command, in percent
    pub volume_step: u8,
    /// How long a sweep waits before scanning, so streams mid-teardown
    /// settle first
    pub sweep_settle_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volume_step: 5,
            sweep_settle_delay_ms: 10,
        }
    }
}
