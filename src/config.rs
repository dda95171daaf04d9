use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::execution::ExecutionConfig;
use crate::strategy::SignalConfig;

/// Everything the bot reads from its JSON config file. Missing keys take defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub signal: SignalConfig,
    pub execution: ExecutionConfig,
}

impl BotConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.signal.validate()?;
        self.execution.validate()
    }
}
