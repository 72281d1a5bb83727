// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Validate hyperparameters
//   Step 2: Start the experiment tracker   (Layer 6 - infra)
//   Step 3: Load the corrupted MNIST data  (Layer 4 - data)
//   Step 4: Save the run config            (Layer 6 - infra)
//   Step 5: Run the training loop          (Layer 5 - ml)
//   Step 6: Record the run summary         (Layer 6 - infra)
//
// Only the training split is used; the test split is loaded so
// that a broken dataset fails the run up front.

use std::env;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::dataset::{corrupt_mnist, DEFAULT_DATA_DIR};
use crate::domain::{record::RunSummary, traits::ExperimentTracker};
use crate::infra::{
    checkpoint::CheckpointManager,
    tracker::{LocalTracker, RemoteTracker},
};
use crate::ml::trainer::run_training;

/// Environment variable naming an HTTP tracking endpoint
pub const TRACKER_URL_ENV: &str = "CNN_MNIST_TRACKER_URL";
/// Bearer token for the tracking endpoint
pub const TRACKER_TOKEN_ENV: &str = "CNN_MNIST_TRACKER_TOKEN";

// ─── Training Configuration ──────────────────────────────────────────────────
// lr, batch_size and epochs come from the command line; the rest
// are fixed for every run. Serialisable so it can be written next
// to the weights and sent to the tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub lr:             f64,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub data_dir:       String,
    pub model_dir:      String,
    pub runs_dir:       String,
    pub project:        String,
    /// Log images and gradients every this many batches
    pub log_interval:   usize,
    /// Number of input images in each logged panel
    pub logged_images:  usize,
    pub histogram_bins: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            lr:             1e-3,
            batch_size:     32,
            epochs:         10,
            data_dir:       DEFAULT_DATA_DIR.to_string(),
            model_dir:      "models".to_string(),
            runs_dir:       "runs".to_string(),
            project:        "corrupt_mnist".to_string(),
            log_interval:   100,
            logged_images:  5,
            histogram_bins: 64,
        }
    }
}

impl TrainConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            bail!("Learning rate must be a positive number, got {}", self.lr);
        }
        if self.batch_size == 0 {
            bail!("Batch size must be at least 1");
        }
        if self.epochs == 0 {
            bail!("Epochs must be at least 1");
        }
        if self.log_interval == 0 {
            bail!("Log interval must be at least 1");
        }
        Ok(())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline and return the run summary.
    pub fn execute(&self) -> Result<RunSummary> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Experiment tracker ────────────────────────────────────────
        let mut tracker = build_tracker(cfg)?;

        // ── Step 3: Data ──────────────────────────────────────────────────────
        let (train_set, test_set) = corrupt_mnist(&cfg.data_dir)
            .with_context(|| format!("Cannot load corrupted MNIST from '{}'", cfg.data_dir))?;
        tracing::info!(
            "Data ready: {} train, {} test images",
            train_set.items().len(),
            test_set.items().len()
        );

        // ── Step 4: Save config next to the weights ───────────────────────────
        let ckpt = CheckpointManager::new(&cfg.model_dir)?;
        ckpt.save_config(cfg)?;

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let outcome = run_training(cfg, train_set, tracker.as_mut(), &ckpt)?;

        // ── Step 6: Summary ───────────────────────────────────────────────────
        tracker.finish(&outcome.summary)?;
        tracing::info!("Training complete (run {})", tracker.run_id());

        Ok(outcome.summary)
    }
}

/// Local run directory, mirrored to an HTTP endpoint when
/// CNN_MNIST_TRACKER_URL is set.
fn build_tracker(cfg: &TrainConfig) -> Result<Box<dyn ExperimentTracker>> {
    let local = LocalTracker::init(&cfg.runs_dir, &cfg.project, cfg)?;

    match env::var(TRACKER_URL_ENV) {
        Ok(url) => {
            let token = env::var(TRACKER_TOKEN_ENV).ok();
            let remote = RemoteTracker::init(local, &url, token.as_deref(), cfg)?;
            Ok(Box::new(remote))
        }
        Err(_) => Ok(Box::new(local)),
    }
}
