// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Persists the trained model with Burn's CompactRecorder.
//
// Files written at the end of a run:
//
//   models/
//     model.mpk             ← model parameters (named MessagePack,
//                             half precision)
//     train_config.json     ← hyperparameters of the run
//
// The recorder is type-safe: loading into a model with a
// different architecture fails instead of silently mismatching.

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::Cnn;

const MODEL_STEM: &str = "model";
// Extension CompactRecorder appends to the stem
const MODEL_EXT: &str = "mpk";
const CONFIG_FILE: &str = "train_config.json";

/// Saves and loads the model weights and run configuration.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create model directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path the weights are written to, extension included.
    pub fn model_path(&self) -> PathBuf {
        self.dir.join(format!("{MODEL_STEM}.{MODEL_EXT}"))
    }

    /// Save the model parameters.
    pub fn save_model<B: Backend>(&self, model: &Cnn<B>) -> Result<PathBuf> {
        // The recorder appends the extension itself
        let path = self.dir.join(MODEL_STEM);

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        let saved = self.model_path();
        tracing::info!("Saved model to '{}'", saved.display());
        Ok(saved)
    }

    /// Load saved parameters into a freshly initialised `model`.
    pub fn load_model<B: Backend>(&self, model: Cnn<B>, device: &B::Device) -> Result<Cnn<B>> {
        let path = self.dir.join(MODEL_STEM);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Has training been run?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::CnnConfig;
    use burn::backend::NdArray;

    #[test]
    fn test_saved_weights_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path().join("models")).unwrap();
        let device = Default::default();

        let model: Cnn<NdArray> = CnnConfig::new().init(&device);
        let saved = manager.save_model(&model).unwrap();
        assert!(saved.is_file());
        assert_eq!(saved, manager.model_path());

        // The reported path is exactly what the recorder wrote
        let on_disk: Vec<String> = fs::read_dir(dir.path().join("models"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(on_disk, vec!["model.mpk".to_string()]);

        let fresh: Cnn<NdArray> = CnnConfig::new().init(&device);
        let loaded = manager.load_model(fresh, &device).unwrap();

        let input = Tensor::<NdArray, 4>::ones([1, 1, 28, 28], &device);
        let a: Vec<f32> = model.forward(input.clone()).into_data().convert::<f32>().to_vec().unwrap();
        let b: Vec<f32> = loaded.forward(input).into_data().convert::<f32>().to_vec().unwrap();

        // Weights are stored in half precision
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-2, "{x} vs {y}");
        }
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let cfg = TrainConfig { lr: 0.01, epochs: 2, ..TrainConfig::default() };

        manager.save_config(&cfg).unwrap();
        let back = manager.load_config().unwrap();
        assert_eq!(back.lr, 0.01);
        assert_eq!(back.epochs, 2);
    }

    #[test]
    fn test_load_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let device = Default::default();
        let model: Cnn<NdArray> = CnnConfig::new().init(&device);
        assert!(manager.load_model(model, &device).is_err());
    }
}
