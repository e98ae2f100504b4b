//! Epoch-batched training scheduler over the bounded sample buffer.
//!
//! "Batches" here only group the schedule: every sample still applies an
//! immediate full parameter update (single-sample SGD), so chunking reorders
//! work without averaging gradients.

use crate::config::{ConfigError, TrainerConfig};
use crate::nn::{Network, NetworkError};
use crate::sample::{heuristic_action, Sample, SampleBuffer};
use crate::scheduler::{FrameClock, StopToken};
use crate::telemetry::{Telemetry, TelemetryError};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum buffer size for a training run, and the scheduling chunk size.
pub const BATCH_SIZE: usize = 32;
/// Epochs per cooperative burst in continuous mode.
pub const BURST_EPOCHS: u32 = 10;

/// Aggregate training state pushed to the stats observer after every buffer
/// mutation and every training pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub total_samples: usize,
    pub current_loss: f64,
    pub trained_epochs: u64,
}

pub struct Trainer {
    buffer: SampleBuffer,
    stats: TrainingStats,
    rng: ChaCha12Rng,
    batch_size: usize,
    burst_epochs: u32,
    observer: Option<Box<dyn FnMut(&TrainingStats)>>,
}

impl Trainer {
    pub fn new(config: &TrainerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            buffer: SampleBuffer::with_capacity(config.buffer_capacity),
            stats: TrainingStats::default(),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            batch_size: config.batch_size,
            burst_epochs: config.burst_epochs,
            observer: None,
        })
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn buffer(&self) -> &SampleBuffer {
        &self.buffer
    }

    /// Register the stats observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl FnMut(&TrainingStats) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.stats);
        }
    }

    /// Validate the frame and append a labeled sample (FIFO eviction at
    /// capacity).
    pub fn add_sample(&mut self, telemetry: &Telemetry, label: f64) -> Result<(), TelemetryError> {
        telemetry.validate()?;
        self.buffer.push(Sample::from_telemetry(telemetry, label));
        self.stats.total_samples = self.buffer.len();
        self.notify();
        Ok(())
    }

    /// Label the frame with the heuristic oracle, then append it.
    pub fn collect_from_telemetry(&mut self, telemetry: &Telemetry) -> Result<(), TelemetryError> {
        telemetry.validate()?;
        let label = heuristic_action(telemetry);
        self.add_sample(telemetry, label)
    }

    /// Run `epochs` shuffled passes over the buffer, mutating `net` in place.
    ///
    /// Each epoch shuffles a full index permutation, splits it into
    /// contiguous chunks of `batch_size` (last chunk may be short) and trains
    /// once per sample. Returns `Ok(None)` without touching the stats when
    /// the buffer holds fewer than `batch_size` samples (a soft condition,
    /// not an error) or when `epochs` is zero; otherwise `Ok(Some(mean_mse))`
    /// over every sample processed in the run.
    pub fn run_epochs(
        &mut self,
        net: &mut Network,
        learning_rate: f64,
        epochs: u32,
    ) -> Result<Option<f64>, NetworkError> {
        if epochs == 0 || self.buffer.len() < self.batch_size {
            return Ok(None);
        }

        let mut total_mse = 0.0;
        let mut processed = 0usize;
        let mut order: Vec<usize> = (0..self.buffer.len()).collect();
        for _ in 0..epochs {
            order.shuffle(&mut self.rng);
            for chunk in order.chunks(self.batch_size) {
                for &idx in chunk {
                    let Some(sample) = self.buffer.get(idx).copied() else {
                        continue;
                    };
                    total_mse += net.train_step(&sample.inputs, &sample.target, learning_rate)?;
                    processed += 1;
                }
            }
        }

        let mean = total_mse / processed as f64;
        self.stats.current_loss = mean;
        self.stats.trained_epochs += u64::from(epochs);
        self.notify();
        Ok(Some(mean))
    }

    /// Continuous training: one burst of `burst_epochs` per granted frame
    /// until the clock runs out or the token is stopped. The token is polled
    /// once per frame boundary; a burst in flight always completes.
    pub fn run_continuous(
        &mut self,
        net: &mut Network,
        learning_rate: f64,
        clock: &mut dyn FrameClock,
        token: &StopToken,
    ) -> Result<(), NetworkError> {
        while clock.next_frame() {
            if token.is_stopped() {
                break;
            }
            self.run_epochs(net, learning_rate, self.burst_epochs)?;
        }
        Ok(())
    }

    /// Clear the buffer and zero all statistics.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.stats = TrainingStats::default();
        self.notify();
    }
}

impl fmt::Debug for Trainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trainer")
            .field("buffer_len", &self.buffer.len())
            .field("stats", &self.stats)
            .field("batch_size", &self.batch_size)
            .field("burst_epochs", &self.burst_epochs)
            .finish_non_exhaustive()
    }
}
