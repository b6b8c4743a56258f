//! Configuration for a CardBridge deployment.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{BridgeError, EnvironmentId, Minimums, Result, constants};

/// Deployment-time configuration of one bridge instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Environment mixed into every payment fingerprint.
    #[serde(default)]
    pub environment_id: EnvironmentId,
    /// Initial minimum for native payments.
    pub native_minimum: Decimal,
    /// Initial minimum for token payments.
    pub token_minimum: Decimal,
    /// Symbol of the accepted token, for logs and display.
    #[serde(default = "default_token_symbol")]
    pub token_symbol: String,
    /// Buffer size of the event subscription channel.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_token_symbol() -> String {
    constants::DEFAULT_TOKEN_SYMBOL.to_string()
}

fn default_event_channel_capacity() -> usize {
    constants::DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let minimums = Minimums::default();
        Self {
            environment_id: EnvironmentId::default(),
            native_minimum: minimums.native,
            token_minimum: minimums.token,
            token_symbol: default_token_symbol(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BridgeError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check that minimums are positive and the channel can buffer events.
    pub fn validate(&self) -> Result<()> {
        if self.native_minimum <= Decimal::ZERO {
            return Err(BridgeError::Configuration(format!(
                "native_minimum must be > 0, got {}",
                self.native_minimum
            )));
        }
        if self.token_minimum <= Decimal::ZERO {
            return Err(BridgeError::Configuration(format!(
                "token_minimum must be > 0, got {}",
                self.token_minimum
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(BridgeError::Configuration(
                "event_channel_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn minimums(&self) -> Minimums {
        Minimums::new(self.native_minimum, self.token_minimum)
    }
}
