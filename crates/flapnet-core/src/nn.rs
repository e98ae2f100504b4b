//! Two-layer feedforward network: input → hidden (sigmoid) → output (sigmoid).
//! Dimensions are fixed at construction; training is single-sample gradient
//! descent applied in place.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::DimensionMismatch { expected, actual } => write!(
                f,
                "vector length ({actual}) does not match network dimension ({expected})"
            ),
        }
    }
}

impl Error for NetworkError {}

/// Logistic activation with the pre-activation clamped so the exponential
/// stays finite.
fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-x).exp())
}

/// Dimensions are carried by the parameter arrays themselves:
/// `w_ih` is input_size×hidden_size, `w_ho` hidden_size×output_size,
/// `b_h`/`b_o` the layer biases.
pub struct Network {
    w_ih: Vec<Vec<f64>>,
    w_ho: Vec<Vec<f64>>,
    b_h: Vec<f64>,
    b_o: Vec<f64>,
    // activation snapshot from the most recent forward pass
    last_inputs: Option<Vec<f64>>,
    last_hidden: Option<Vec<f64>>,
    last_output: Option<Vec<f64>>,
}

/// Borrowed view of the raw parameters, for read-only consumers.
#[derive(Clone, Copy, Debug)]
pub struct Parameters<'a> {
    pub weights_ih: &'a [Vec<f64>],
    pub weights_ho: &'a [Vec<f64>],
    pub bias_h: &'a [f64],
    pub bias_o: &'a [f64],
}

/// Last forward-pass activations, zero-filled until the first pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Activations {
    pub inputs: Vec<f64>,
    pub hidden: Vec<f64>,
    pub output: Vec<f64>,
}

/// Persisted parameter record. Field names follow the exported wire format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(rename = "weightsIH")]
    pub weights_ih: Vec<Vec<f64>>,
    #[serde(rename = "weightsHO")]
    pub weights_ho: Vec<Vec<f64>>,
    #[serde(rename = "biasH")]
    pub bias_h: Vec<f64>,
    #[serde(rename = "biasO")]
    pub bias_o: Vec<f64>,
}

impl Network {
    /// Create a network with weights drawn independently uniform in [-1, 1]
    /// and zero biases. A plain uniform draw, kept deliberately (no variance
    /// scaling by fan-in).
    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        let mut draw = |rows: usize, cols: usize| -> Vec<Vec<f64>> {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.random::<f64>() * 2.0 - 1.0).collect())
                .collect()
        };
        let w_ih = draw(input_size, hidden_size);
        let w_ho = draw(hidden_size, output_size);
        Self {
            w_ih,
            w_ho,
            b_h: vec![0.0; hidden_size],
            b_o: vec![0.0; output_size],
            last_inputs: None,
            last_hidden: None,
            last_output: None,
        }
    }

    /// All-zero parameters. Useful as a restore target and in tests.
    pub fn zeroed(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self {
            w_ih: vec![vec![0.0; hidden_size]; input_size],
            w_ho: vec![vec![0.0; output_size]; hidden_size],
            b_h: vec![0.0; hidden_size],
            b_o: vec![0.0; output_size],
            last_inputs: None,
            last_hidden: None,
            last_output: None,
        }
    }

    pub fn input_size(&self) -> usize {
        self.w_ih.len()
    }

    pub fn hidden_size(&self) -> usize {
        self.b_h.len()
    }

    pub fn output_size(&self) -> usize {
        self.b_o.len()
    }

    fn check_input(&self, inputs: &[f64]) -> Result<(), NetworkError> {
        if inputs.len() != self.input_size() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.input_size(),
                actual: inputs.len(),
            });
        }
        Ok(())
    }

    fn propagate(&self, inputs: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut hidden = self.b_h.clone();
        for (&x, row) in inputs.iter().zip(&self.w_ih) {
            for (h, &w) in hidden.iter_mut().zip(row) {
                *h += x * w;
            }
        }
        for h in &mut hidden {
            *h = sigmoid(*h);
        }

        let mut output = self.b_o.clone();
        for (&h, row) in hidden.iter().zip(&self.w_ho) {
            for (o, &w) in output.iter_mut().zip(row) {
                *o += h * w;
            }
        }
        for o in &mut output {
            *o = sigmoid(*o);
        }

        (hidden, output)
    }

    fn cache_activations(&mut self, inputs: &[f64], hidden: Vec<f64>, output: Vec<f64>) {
        self.last_inputs = Some(inputs.to_vec());
        self.last_hidden = Some(hidden);
        self.last_output = Some(output);
    }

    /// Evaluate the network and cache the activation snapshot (overwritten on
    /// every pass).
    pub fn forward(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        self.check_input(inputs)?;
        let (hidden, output) = self.propagate(inputs);
        let result = output.clone();
        self.cache_activations(inputs, hidden, output);
        Ok(result)
    }

    /// One forward pass followed by a full in-place parameter update, scaled
    /// by `learning_rate`. Returns the mean squared error over output units
    /// for this one sample.
    pub fn train_step(
        &mut self,
        inputs: &[f64],
        targets: &[f64],
        learning_rate: f64,
    ) -> Result<f64, NetworkError> {
        self.check_input(inputs)?;
        if targets.len() != self.output_size() {
            return Err(NetworkError::DimensionMismatch {
                expected: self.output_size(),
                actual: targets.len(),
            });
        }

        let (hidden, output) = self.propagate(inputs);

        // Error terms use the post-activation values (sigmoid derivative
        // y * (1 - y)); hidden errors read the pre-update output weights.
        let mut output_err = vec![0.0; output.len()];
        for (k, e) in output_err.iter_mut().enumerate() {
            *e = (targets[k] - output[k]) * output[k] * (1.0 - output[k]);
        }
        let mut hidden_err = vec![0.0; hidden.len()];
        for ((e, row), &h) in hidden_err.iter_mut().zip(&self.w_ho).zip(&hidden) {
            let back: f64 = output_err.iter().zip(row).map(|(&oe, &w)| oe * w).sum();
            *e = back * h * (1.0 - h);
        }

        for (row, &h) in self.w_ho.iter_mut().zip(&hidden) {
            for (w, &oe) in row.iter_mut().zip(&output_err) {
                *w += learning_rate * oe * h;
            }
        }
        for (b, &oe) in self.b_o.iter_mut().zip(&output_err) {
            *b += learning_rate * oe;
        }
        for (row, &x) in self.w_ih.iter_mut().zip(inputs) {
            for (w, &he) in row.iter_mut().zip(&hidden_err) {
                *w += learning_rate * he * x;
            }
        }
        for (b, &he) in self.b_h.iter_mut().zip(&hidden_err) {
            *b += learning_rate * he;
        }

        let mse = targets
            .iter()
            .zip(&output)
            .map(|(t, y)| (t - y).powi(2))
            .sum::<f64>()
            / output.len() as f64;

        self.cache_activations(inputs, hidden, output);
        Ok(mse)
    }

    pub fn parameters(&self) -> Parameters<'_> {
        Parameters {
            weights_ih: &self.w_ih,
            weights_ho: &self.w_ho,
            bias_h: &self.b_h,
            bias_o: &self.b_o,
        }
    }

    /// Activation snapshot for read-only consumers. Zero-filled vectors of
    /// the declared sizes before the first forward pass.
    pub fn activations(&self) -> Activations {
        Activations {
            inputs: self
                .last_inputs
                .clone()
                .unwrap_or_else(|| vec![0.0; self.input_size()]),
            hidden: self
                .last_hidden
                .clone()
                .unwrap_or_else(|| vec![0.0; self.hidden_size()]),
            output: self
                .last_output
                .clone()
                .unwrap_or_else(|| vec![0.0; self.output_size()]),
        }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            weights_ih: self.w_ih.clone(),
            weights_ho: self.w_ho.clone(),
            bias_h: self.b_h.clone(),
            bias_o: self.b_o.clone(),
        }
    }

    /// Replace all four parameter arrays verbatim. Dimensions are not checked
    /// here; a snapshot whose shape disagrees with the caller's feature
    /// vectors surfaces as a dimension error on the next forward pass.
    pub fn restore(&mut self, snapshot: NetworkSnapshot) {
        self.w_ih = snapshot.weights_ih;
        self.w_ho = snapshot.weights_ho;
        self.b_h = snapshot.bias_h;
        self.b_o = snapshot.bias_o;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }

    /// Parse a persisted snapshot and restore it. A parse failure propagates
    /// before any parameter is touched, so the model is never left
    /// half-updated.
    pub fn restore_json(&mut self, payload: &str) -> serde_json::Result<()> {
        let snapshot: NetworkSnapshot = serde_json::from_str(payload)?;
        self.restore(snapshot);
        Ok(())
    }
}

impl Clone for Network {
    /// Deep-copies the parameters; the activation cache starts empty on the
    /// copy.
    fn clone(&self) -> Self {
        Self {
            w_ih: self.w_ih.clone(),
            w_ho: self.w_ho.clone(),
            b_h: self.b_h.clone(),
            b_o: self.b_o.clone(),
            last_inputs: None,
            last_hidden: None,
            last_output: None,
        }
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("input_size", &self.input_size())
            .field("hidden_size", &self.hidden_size())
            .field("output_size", &self.output_size())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn seeded(seed: u64) -> Network {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        Network::with_rng(4, 8, 1, &mut rng)
    }

    #[test]
    fn initialization_is_deterministic_for_fixed_seed() {
        let a = seeded(7);
        let b = seeded(7);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn initial_weights_uniform_biases_zero() {
        let net = seeded(11);
        let p = net.parameters();
        assert!(p
            .weights_ih
            .iter()
            .flatten()
            .chain(p.weights_ho.iter().flatten())
            .all(|w| (-1.0..=1.0).contains(w)));
        assert!(p.bias_h.iter().chain(p.bias_o).all(|&b| b == 0.0));
    }

    #[test]
    fn forward_output_in_open_unit_interval() {
        let mut net = seeded(3);
        let output = net.forward(&[1.0, 0.0, 0.5, 1.0]).unwrap();
        assert_eq!(output.len(), 1);
        for &y in &output {
            assert!(y > 0.0 && y < 1.0, "output {y} outside (0, 1)");
        }
    }

    #[test]
    fn forward_rejects_wrong_input_length() {
        let mut net = seeded(3);
        assert_eq!(
            net.forward(&[0.0, 0.0, 0.0]),
            Err(NetworkError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn zero_network_centers_every_activation() {
        let mut net = Network::zeroed(4, 8, 1);
        let output = net.forward(&[0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(output, vec![0.5]);
        let acts = net.activations();
        assert_eq!(acts.hidden, vec![0.5; 8]);
    }

    #[test]
    fn extreme_preactivations_stay_finite() {
        let mut net = Network::zeroed(4, 8, 1);
        let mut snap = net.snapshot();
        for row in &mut snap.weights_ih {
            for w in row {
                *w = 1.0e6;
            }
        }
        net.restore(snap);
        let output = net.forward(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(output[0].is_finite());
    }

    #[test]
    fn train_step_reduces_loss_on_fixed_sample() {
        let mut net = seeded(5);
        let inputs = [0.6, 0.5, 0.3, 0.5];
        let targets = [1.0];
        let first = net.train_step(&inputs, &targets, 0.3).unwrap();
        assert!(first >= 0.0);
        let mut last = first;
        for _ in 0..200 {
            last = net.train_step(&inputs, &targets, 0.3).unwrap();
        }
        assert!(
            last < first,
            "loss should shrink on a fixed sample: {first} -> {last}"
        );
    }

    #[test]
    fn train_step_rejects_wrong_target_length() {
        let mut net = seeded(5);
        assert_eq!(
            net.train_step(&[0.0; 4], &[1.0, 0.0], 0.1),
            Err(NetworkError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn train_step_moves_output_toward_target() {
        let mut net = Network::zeroed(4, 8, 1);
        net.train_step(&[0.5, 0.5, 0.5, 0.5], &[1.0], 0.5).unwrap();
        let output = net.forward(&[0.5, 0.5, 0.5, 0.5]).unwrap();
        assert!(output[0] > 0.5, "output should move toward 1.0");
    }

    #[test]
    fn clone_matches_source_output_with_empty_cache() {
        let mut source = seeded(13);
        let inputs = [0.2, 0.9, 0.1, 0.7];
        source.forward(&inputs).unwrap();

        let mut copy = source.clone();
        assert_eq!(copy.activations().output, vec![0.0], "cache not copied");
        assert_eq!(copy.forward(&inputs).unwrap(), source.activations().output);
    }

    #[test]
    fn activations_zero_filled_before_first_pass() {
        let net = seeded(17);
        let acts = net.activations();
        assert_eq!(acts.inputs, vec![0.0; 4]);
        assert_eq!(acts.hidden, vec![0.0; 8]);
        assert_eq!(acts.output, vec![0.0; 1]);
    }

    #[test]
    fn snapshot_json_round_trips_exactly() {
        let net = seeded(23);
        let mut restored = Network::zeroed(4, 8, 1);
        restored.restore_json(&net.to_json().unwrap()).unwrap();
        assert_eq!(restored.snapshot(), net.snapshot());
    }

    #[test]
    fn snapshot_uses_wire_field_names() {
        let json = Network::zeroed(1, 1, 1).to_json().unwrap();
        for key in ["weightsIH", "weightsHO", "biasH", "biasO"] {
            assert!(json.contains(key), "missing `{key}` in {json}");
        }
    }

    #[test]
    fn malformed_payload_leaves_parameters_untouched() {
        let mut net = seeded(29);
        let before = net.snapshot();
        assert!(net.restore_json("{\"weightsIH\": [[").is_err());
        assert_eq!(net.snapshot(), before);
    }

    #[test]
    fn mismatched_restore_fails_on_next_forward() {
        let mut net = seeded(31);
        net.restore(Network::zeroed(3, 2, 1).snapshot());
        assert_eq!(
            net.forward(&[0.0; 4]),
            Err(NetworkError::DimensionMismatch {
                expected: 3,
                actual: 4
            })
        );
    }
}
