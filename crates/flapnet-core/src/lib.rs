//! Online-learning loop for gap-navigation control: a small feedforward
//! network trained continuously from simulation telemetry, then used to
//! drive the same simulation autonomously.
//!
//! The crate is single-threaded. One orchestrator owns the
//! [`Network`]; the [`Trainer`] and the control policy borrow it mutably
//! only for the duration of a training call or a decision, and the
//! visualization surface ([`Network::parameters`] / [`Network::activations`])
//! is read-only. Long trainings are chunked into short bursts driven by a
//! cooperative [`FrameClock`].

pub mod config;
pub mod nn;
pub mod policy;
pub mod sample;
pub mod scheduler;
pub mod telemetry;
pub mod trainer;

pub use config::{ConfigError, TrainerConfig};
pub use nn::{Activations, Network, NetworkError, NetworkSnapshot, Parameters};
pub use policy::{decide, PolicyError};
pub use sample::{heuristic_action, Sample, SampleBuffer, BUFFER_CAPACITY};
pub use scheduler::{FrameBudget, FrameClock, StopToken};
pub use telemetry::{Telemetry, TelemetryError, FEATURE_COUNT};
pub use trainer::{Trainer, TrainingStats, BATCH_SIZE, BURST_EPOCHS};
