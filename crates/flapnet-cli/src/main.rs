use anyhow::Context;
use clap::{Parser, Subcommand};
use flapnet_core::{
    decide, heuristic_action, FrameBudget, Network, NetworkSnapshot, StopToken, Telemetry,
    Trainer, TrainerConfig, TrainingStats, FEATURE_COUNT,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "flapnet",
    about = "Headless training and autopilot driver for the gap-navigation network"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collect oracle-labeled telemetry and train the network in bursts
    Train {
        /// Telemetry frames to collect before training
        #[arg(long, default_value_t = 2000)]
        frames: usize,
        /// Cooperative training bursts to run (burst_epochs epochs each)
        #[arg(long, default_value_t = 10)]
        bursts: usize,
        #[arg(long, default_value_t = 0.1)]
        learning_rate: f64,
        #[arg(long, default_value_t = 8)]
        hidden_size: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Write the trained parameter snapshot to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay synthetic telemetry through a trained network's decisions
    Autopilot {
        /// Parameter snapshot produced by `train --out`
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long, default_value_t = 1000)]
        frames: usize,
        #[arg(long, default_value_t = 7)]
        seed: u64,
    },
}

/// Scripted telemetry source: a drifting gap and a bird that loosely tracks
/// it. A demo driver for the headless CLI, not a physics engine.
struct TelemetryScript {
    rng: ChaCha12Rng,
    gap_center_y: f64,
    position_y: f64,
    distance: f64,
}

impl TelemetryScript {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha12Rng::seed_from_u64(seed),
            gap_center_y: 0.5,
            position_y: 0.5,
            distance: 1.0,
        }
    }

    fn next_frame(&mut self) -> Telemetry {
        let velocity = self.rng.random::<f64>();
        self.gap_center_y =
            (self.gap_center_y + self.rng.random_range(-0.05..0.05)).clamp(0.1, 0.9);
        self.position_y = (self.position_y
            + (velocity - 0.5) * 0.2
            + self.rng.random_range(-0.1..0.1))
        .clamp(0.0, 1.0);
        self.distance -= 0.05;
        if self.distance < 0.0 {
            self.distance = 1.0;
        }
        Telemetry {
            position_y: self.position_y,
            velocity,
            distance: self.distance,
            gap_center_y: self.gap_center_y,
        }
    }
}

#[derive(Serialize)]
struct TrainReport {
    frames: usize,
    bursts: usize,
    stats: TrainingStats,
}

#[derive(Serialize)]
struct AutopilotReport {
    frames: usize,
    flaps: usize,
    flap_rate: f64,
    oracle_agreement: f64,
}

fn network_from_snapshot(snapshot: NetworkSnapshot) -> Network {
    let mut net = Network::zeroed(
        snapshot.weights_ih.len(),
        snapshot.bias_h.len(),
        snapshot.bias_o.len(),
    );
    net.restore(snapshot);
    net
}

fn run_train(
    frames: usize,
    bursts: usize,
    learning_rate: f64,
    hidden_size: usize,
    seed: u64,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = TrainerConfig {
        hidden_size,
        learning_rate,
        seed,
        ..TrainerConfig::default()
    };
    let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
    let mut net = Network::with_rng(FEATURE_COUNT, config.hidden_size, 1, &mut rng);
    let mut trainer = Trainer::new(&config)?;

    let mut script = TelemetryScript::new(config.seed.wrapping_add(1));
    for _ in 0..frames {
        trainer.collect_from_telemetry(&script.next_frame())?;
    }

    let mut clock = FrameBudget::new(bursts);
    let token = StopToken::new();
    trainer.run_continuous(&mut net, config.learning_rate, &mut clock, &token)?;

    let report = TrainReport {
        frames,
        bursts,
        stats: *trainer.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(path) = out {
        std::fs::write(&path, net.to_json()?)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
    }
    Ok(())
}

fn run_autopilot(snapshot: PathBuf, frames: usize, seed: u64) -> anyhow::Result<()> {
    let payload = std::fs::read_to_string(&snapshot)
        .with_context(|| format!("reading snapshot from {}", snapshot.display()))?;
    let snap: NetworkSnapshot = serde_json::from_str(&payload).context("parsing snapshot")?;
    let mut net = network_from_snapshot(snap);

    let mut script = TelemetryScript::new(seed);
    let mut flaps = 0usize;
    let mut agreements = 0usize;
    for _ in 0..frames {
        let t = script.next_frame();
        let flap = decide(&mut net, &t)?;
        if flap {
            flaps += 1;
        }
        if flap == (heuristic_action(&t) > 0.5) {
            agreements += 1;
        }
    }

    let denom = frames.max(1) as f64;
    let report = AutopilotReport {
        frames,
        flaps,
        flap_rate: flaps as f64 / denom,
        oracle_agreement: agreements as f64 / denom,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Train {
            frames,
            bursts,
            learning_rate,
            hidden_size,
            seed,
            out,
        } => run_train(frames, bursts, learning_rate, hidden_size, seed, out),
        Command::Autopilot {
            snapshot,
            frames,
            seed,
        } => run_autopilot(snapshot, frames, seed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_frames_stay_normalized() {
        let mut script = TelemetryScript::new(42);
        for _ in 0..500 {
            let t = script.next_frame();
            assert!(t.validate().is_ok());
            for v in t.features() {
                assert!((0.0..=1.0).contains(&v), "feature {v} out of range");
            }
        }
    }

    #[test]
    fn snapshot_loader_recovers_dimensions() {
        let mut rng = ChaCha12Rng::seed_from_u64(1);
        let source = Network::with_rng(FEATURE_COUNT, 6, 1, &mut rng);
        let net = network_from_snapshot(source.snapshot());
        assert_eq!(net.input_size(), FEATURE_COUNT);
        assert_eq!(net.hidden_size(), 6);
        assert_eq!(net.output_size(), 1);
        assert_eq!(net.snapshot(), source.snapshot());
    }
}
