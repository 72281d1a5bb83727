// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// From IDX files on disk to tensor batches:
//
//   *_images.idx / *_target.idx
//       │
//       ▼
//   IdxArray             → decodes the raw tensor files
//       │
//       ▼
//   CorruptMnistDataset  → validated split, Burn Dataset trait
//       │
//       ▼
//   MnistBatcher         → normalised [N, 1, 28, 28] batches
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop

/// Typed errors for loading and validating the data
pub mod error;

/// IDX tensor file reader/writer
pub mod idx;

/// The corrupted MNIST splits
pub mod dataset;

/// Burn Batcher for MNIST items
pub mod batcher;
