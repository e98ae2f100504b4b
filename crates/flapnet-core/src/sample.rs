use crate::telemetry::{Telemetry, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default bound on the training buffer.
pub const BUFFER_CAPACITY: usize = 10_000;

/// One (input, target) training pair. Immutable once created.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub inputs: [f64; FEATURE_COUNT],
    pub target: [f64; 1],
}

impl Sample {
    pub fn from_telemetry(telemetry: &Telemetry, label: f64) -> Self {
        Self {
            inputs: telemetry.features(),
            target: [label],
        }
    }
}

/// Rule-based labeling oracle: flap (1.0) when the bird sits above the gap
/// center, with a small velocity-dependent shift of the threshold. A stand-in
/// for a reward signal, not a ground-truth optimum.
pub fn heuristic_action(telemetry: &Telemetry) -> f64 {
    let velocity_factor = (telemetry.velocity - 0.5) * 0.1;
    if telemetry.position_y > telemetry.gap_center_y - velocity_factor {
        1.0
    } else {
        0.0
    }
}

/// Bounded, insertion-ordered sample store. Appending at capacity discards
/// the single oldest sample (strict FIFO; reads never reorder).
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(position_y: f64, velocity: f64, gap_center_y: f64) -> Telemetry {
        Telemetry {
            position_y,
            velocity,
            distance: 0.5,
            gap_center_y,
        }
    }

    #[test]
    fn heuristic_flaps_above_gap_center() {
        assert_eq!(heuristic_action(&frame(0.6, 0.5, 0.5)), 1.0);
    }

    #[test]
    fn heuristic_falls_below_gap_center() {
        assert_eq!(heuristic_action(&frame(0.4, 0.5, 0.5)), 0.0);
    }

    #[test]
    fn heuristic_velocity_shifts_threshold() {
        // velocity 1.0 -> factor 0.05, threshold drops to 0.45
        assert_eq!(heuristic_action(&frame(0.46, 1.0, 0.5)), 1.0);
        // velocity 0.0 -> factor -0.05, threshold rises to 0.55
        assert_eq!(heuristic_action(&frame(0.54, 0.0, 0.5)), 0.0);
    }

    #[test]
    fn sample_copies_feature_order() {
        let s = Sample::from_telemetry(&frame(0.6, 0.5, 0.5), 1.0);
        assert_eq!(s.inputs, [0.6, 0.5, 0.5, 0.5]);
        assert_eq!(s.target, [1.0]);
    }

    fn tagged(distance: f64) -> Sample {
        Sample {
            inputs: [0.0, 0.0, distance, 0.0],
            target: [0.0],
        }
    }

    #[test]
    fn buffer_evicts_oldest_first() {
        let mut buffer = SampleBuffer::with_capacity(3);
        for i in 0..4 {
            buffer.push(tagged(i as f64));
        }
        assert_eq!(buffer.len(), 3);
        // sample 0 is the one absent; order of the rest is preserved
        let distances: Vec<f64> = buffer.iter().map(|s| s.inputs[2]).collect();
        assert_eq!(distances, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn buffer_never_exceeds_capacity() {
        let mut buffer = SampleBuffer::with_capacity(5);
        for i in 0..50 {
            buffer.push(tagged(i as f64));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn buffer_clear_empties() {
        let mut buffer = SampleBuffer::with_capacity(3);
        buffer.push(tagged(0.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);
    }
}
