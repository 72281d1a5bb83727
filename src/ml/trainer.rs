// ============================================================
// Layer 5 - Training Loop
// ============================================================
// Adam + cross-entropy over the training split, in file order.
//
// Per batch:
//   forward → loss → backward → Adam step
//   log train_loss / train_accuracy to the tracker
//
// Every `log_interval` batches (0, 100, 200, ... within an epoch):
//   progress line, the first input images as a panel, and a
//   histogram of every parameter gradient
//
// Per epoch:
//   one-vs-rest ROC curves of the raw logits, one per class
//
// After the last epoch:
//   accuracy and support-weighted precision/recall/F1 over the
//   final epoch's predictions, then the weights are saved
//
// Training runs on Autodiff<Wgpu>; `train_loop` is generic so
// tests can drive it on the CPU backend.

use anyhow::{anyhow, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::MnistBatcher,
    dataset::{CorruptMnistDataset, HEIGHT, NUM_CLASSES, WIDTH},
};
use crate::domain::{
    record::{LoggedValue, RocCurve, RunSummary},
    traits::ExperimentTracker,
};
use crate::infra::{checkpoint::CheckpointManager, media};
use crate::ml::{
    evaluation::{argmax_rows, classification_report, histogram, roc_curve, ClassificationReport},
    model::{Cnn, CnnConfig},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Everything a finished run produced besides the saved weights.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub summary: RunSummary,

    /// Final-epoch classification metrics, per class and weighted
    pub report: ClassificationReport,

    /// Loss of every batch, in training order
    pub train_loss: Vec<f64>,

    /// Accuracy of every batch, in training order
    pub train_accuracy: Vec<f64>,
}

pub fn run_training(
    cfg:       &TrainConfig,
    train_set: CorruptMnistDataset,
    tracker:   &mut dyn ExperimentTracker,
    ckpt:      &CheckpointManager,
) -> Result<TrainingReport> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop::<MyBackend>(cfg, train_set, tracker, ckpt, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    train_set: CorruptMnistDataset,
    tracker:   &mut dyn ExperimentTracker,
    ckpt:      &CheckpointManager,
    device:    B::Device,
) -> Result<TrainingReport> {
    let mut model: Cnn<B> = CnnConfig::new().init(&device);
    let mut optim = AdamConfig::new().init();
    let loss_fn = CrossEntropyLossConfig::new().init(&device);

    let loader = DataLoaderBuilder::new(MnistBatcher::default())
        .batch_size(cfg.batch_size)
        .set_device(device.clone())
        .build(train_set);

    let mut train_loss = Vec::new();
    let mut train_accuracy = Vec::new();

    // Logits and targets of the current epoch, row-major [samples, classes]
    let mut epoch_scores: Vec<f32> = Vec::new();
    let mut epoch_targets: Vec<usize> = Vec::new();

    for epoch in 0..cfg.epochs {
        epoch_scores.clear();
        epoch_targets.clear();
        let mut epoch_loss = 0.0f64;
        let mut epoch_batches = 0usize;

        for (i, batch) in loader.iter().enumerate() {
            let batch_len = batch.targets.dims()[0];

            let logits = model.forward(batch.images.clone());
            let loss = loss_fn.forward(logits.clone(), batch.targets.clone());
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let correct: i64 = logits
                .clone()
                .argmax(1)
                .flatten::<1>(0, 1)
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem::<i64>();
            let accuracy = correct as f64 / batch_len as f64;

            epoch_scores.extend(tensor_to_f32(logits.detach())?);
            epoch_targets.extend(
                tensor_to_i64(batch.targets.clone())?.into_iter().map(|t| t as usize),
            );

            let grads = loss.backward();
            let periodic = i % cfg.log_interval == 0;
            let grad_values = if periodic { model.gradient_values(&grads) } else { Vec::new() };

            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            epoch_loss += loss_val;
            epoch_batches += 1;
            train_loss.push(loss_val);
            train_accuracy.push(accuracy);
            tracker.log(vec![
                ("train_loss".into(), LoggedValue::Scalar(loss_val)),
                ("train_accuracy".into(), LoggedValue::Scalar(accuracy)),
            ])?;

            if periodic {
                tracing::info!("Epoch {}, iter {}, loss: {:.6}", epoch, i, loss_val);

                let shown = cfg.logged_images.min(batch_len);
                let images = tensor_to_f32(batch.images.slice([0..shown]))?;
                let panel = media::panel_from_images(&images, HEIGHT, WIDTH, "Input images");
                tracker.log(vec![("images".into(), LoggedValue::Image(panel))])?;

                let hist = histogram(&grad_values, cfg.histogram_bins);
                tracker.log(vec![("gradients".into(), LoggedValue::Histogram(hist))])?;
            }
        }

        let curves = roc_curves(&epoch_scores, &epoch_targets);
        tracker.log(vec![("roc".into(), LoggedValue::Roc(curves))])?;

        let mean_loss = epoch_loss / epoch_batches.max(1) as f64;
        tracing::info!("Epoch {} done, mean loss {:.6}", epoch, mean_loss);
    }

    let preds = argmax_rows(&epoch_scores, NUM_CLASSES);
    let report = classification_report(&epoch_targets, &preds, NUM_CLASSES);
    tracing::info!(
        "Final epoch: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
        report.accuracy, report.precision, report.recall, report.f1,
    );

    let model_path = ckpt.save_model(&model)?;

    let summary = RunSummary {
        accuracy:   report.accuracy,
        precision:  report.precision,
        recall:     report.recall,
        f1:         report.f1,
        final_loss: train_loss.last().copied().unwrap_or(f64::NAN),
        epochs:     cfg.epochs,
        model_path: model_path.display().to_string(),
    };

    Ok(TrainingReport { summary, report, train_loss, train_accuracy })
}

/// One ROC curve per class that has both positives and negatives.
fn roc_curves(scores: &[f32], targets: &[usize]) -> Vec<RocCurve> {
    (0..NUM_CLASSES)
        .filter_map(|class_id| {
            let truth: Vec<bool> = targets.iter().map(|&t| t == class_id).collect();
            let column: Vec<f32> = scores
                .chunks_exact(NUM_CLASSES)
                .map(|row| row[class_id])
                .collect();
            roc_curve(&truth, &column).map(|(fpr, tpr, auc)| RocCurve { class_id, fpr, tpr, auc })
        })
        .collect()
}

fn tensor_to_f32<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

fn tensor_to_i64<B: Backend, const D: usize>(tensor: Tensor<B, D, Int>) -> Result<Vec<i64>> {
    tensor
        .into_data()
        .convert::<i64>()
        .to_vec::<i64>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}
