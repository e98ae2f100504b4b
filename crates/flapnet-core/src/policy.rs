//! Autonomous control: map a telemetry frame through the network and
//! threshold the single output to a flap/no-flap decision.

use crate::nn::{Network, NetworkError};
use crate::telemetry::{Telemetry, TelemetryError};
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyError {
    Telemetry(TelemetryError),
    Network(NetworkError),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::Telemetry(e) => write!(f, "{}", e),
            PolicyError::Network(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PolicyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PolicyError::Telemetry(e) => Some(e),
            PolicyError::Network(e) => Some(e),
        }
    }
}

impl From<TelemetryError> for PolicyError {
    fn from(err: TelemetryError) -> Self {
        PolicyError::Telemetry(err)
    }
}

impl From<NetworkError> for PolicyError {
    fn from(err: NetworkError) -> Self {
        PolicyError::Network(err)
    }
}

/// Decide whether to flap for this frame. Builds the same feature vector as
/// sample collection and thresholds strictly: an output of exactly 0.5 means
/// no flap.
pub fn decide(net: &mut Network, telemetry: &Telemetry) -> Result<bool, PolicyError> {
    telemetry.validate()?;
    let output = net.forward(&telemetry.features())?;
    Ok(output.first().is_some_and(|&y| y > 0.5))
}
