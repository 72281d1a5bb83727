// ============================================================
// Layer 3 - Tracker Records
// ============================================================
// What the training driver sends to the experiment tracker.
//
// Two views of the same value exist:
//   LoggedValue  - what the trainer hands over (an image panel
//                  still carries its pixels)
//   StoredValue  - what ends up in the append-only metrics log
//                  (pixels replaced by the path of the PNG file)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A grayscale strip of images, tiles laid out left to right.
/// `pixels` is row-major, `width * height` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePanel {
    pub caption: String,
    pub width:   u32,
    pub height:  u32,
    pub pixels:  Vec<u8>,
}

/// Equal-width histogram. `bin_edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub counts:    Vec<u64>,
}

impl Histogram {
    /// Number of values that fell into some bin
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// One-vs-rest ROC curve for a single class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub class_id: usize,
    pub fpr:      Vec<f64>,
    pub tpr:      Vec<f64>,
    pub auc:      f64,
}

/// A value handed to `ExperimentTracker::log`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoggedValue {
    Scalar(f64),
    Image(ImagePanel),
    Histogram(Histogram),
    Roc(Vec<RocCurve>),
}

/// A value as persisted in the metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "kebab-case")]
pub enum StoredValue {
    Scalar {
        value: f64,
    },
    ImageFile {
        path:    String,
        caption: String,
        width:   u32,
        height:  u32,
    },
    Histogram {
        bin_edges: Vec<f64>,
        counts:    Vec<u64>,
    },
    RocCurves {
        curves: Vec<RocCurve>,
    },
}

/// One line of the append-only metrics log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Increases by one with every `log` call, starting at 0
    pub step: u64,

    /// Seconds since the Unix epoch
    pub timestamp: f64,

    pub values: BTreeMap<String, StoredValue>,
}

/// End-of-run aggregate metrics over the final epoch's predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub accuracy:   f64,
    pub precision:  f64,
    pub recall:     f64,
    pub f1:         f64,
    pub final_loss: f64,
    pub epochs:     usize,
    pub model_path: String,
}
