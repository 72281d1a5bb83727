// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// All tensor maths lives here:
//
//   model.rs      - the CNN classifier
//   trainer.rs    - the training loop, tracker logging, final
//                   metrics and weight saving
//   evaluation.rs - accuracy, weighted precision/recall/F1,
//                   ROC curves and histograms on plain slices

/// CNN classifier architecture
pub mod model;

/// Training loop
pub mod trainer;

/// Classification metrics, ROC curves, histograms
pub mod evaluation;
