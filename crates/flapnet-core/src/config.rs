use crate::sample::BUFFER_CAPACITY;
use crate::trainer::{BATCH_SIZE, BURST_EPOCHS};
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Run configuration for the training loop. Invalid values are rejected at
/// construction time via `validate`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub hidden_size: usize,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub burst_epochs: u32,
    pub buffer_capacity: usize,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            hidden_size: 8,
            learning_rate: 0.1,
            batch_size: BATCH_SIZE,
            burst_epochs: BURST_EPOCHS,
            buffer_capacity: BUFFER_CAPACITY,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroHiddenSize,
    ZeroBatchSize,
    ZeroBurstEpochs,
    ZeroBufferCapacity,
    InvalidLearningRate { value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroHiddenSize => write!(f, "hidden_size must be positive"),
            ConfigError::ZeroBatchSize => write!(f, "batch_size must be positive"),
            ConfigError::ZeroBurstEpochs => write!(f, "burst_epochs must be positive"),
            ConfigError::ZeroBufferCapacity => write!(f, "buffer_capacity must be positive"),
            ConfigError::InvalidLearningRate { value } => {
                write!(f, "learning_rate ({value}) must be finite and positive")
            }
        }
    }
}

impl Error for ConfigError {}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hidden_size == 0 {
            return Err(ConfigError::ZeroHiddenSize);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.burst_epochs == 0 {
            return Err(ConfigError::ZeroBurstEpochs);
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidLearningRate {
                value: self.learning_rate,
            });
        }
        Ok(())
    }
}
