// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Everything that touches the filesystem or the network:
//
//   checkpoint.rs - model weights (CompactRecorder) and the run
//                   config as JSON
//
//   tracker.rs    - experiment tracker: local run directory with
//                   an append-only metrics log, optionally
//                   mirrored to an HTTP endpoint
//
//   media.rs      - renders input images to PNG panels
//
//   gcs.rs        - Cloud Storage JSON API client for bucket IAM

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Experiment tracking
pub mod tracker;

/// Image panels for the tracker
pub mod media;

/// Cloud Storage IAM client
pub mod gcs;

#[cfg(test)]
pub(crate) mod test_server;
