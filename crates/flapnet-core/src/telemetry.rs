use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Number of input features fed to the network per frame.
pub const FEATURE_COUNT: usize = 4;

/// One frame of simulation state, normalized to [0, 1] by the producing
/// simulation. Consumed by both sample collection and policy decisions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub position_y: f64,
    pub velocity: f64,
    pub distance: f64,
    pub gap_center_y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    NonFinite { field: &'static str },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::NonFinite { field } => {
                write!(f, "telemetry field `{field}` is not a finite number")
            }
        }
    }
}

impl Error for TelemetryError {}

impl Telemetry {
    /// Normalization itself is owned by the simulation; only finiteness is
    /// checked here.
    pub fn validate(&self) -> Result<(), TelemetryError> {
        let fields = [
            ("position_y", self.position_y),
            ("velocity", self.velocity),
            ("distance", self.distance),
            ("gap_center_y", self.gap_center_y),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(TelemetryError::NonFinite { field });
            }
        }
        Ok(())
    }

    /// Feature vector order: position, velocity, distance, gap-center.
    /// Sample collection and the control policy must agree on this layout.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.position_y,
            self.velocity,
            self.distance,
            self.gap_center_y,
        ]
    }
}
