#![recursion_limit = "256"]

//! Corrupted-MNIST CNN training and a small Cloud Storage IAM helper.
//!
//! The crate is split into the same layers the binaries walk through:
//!
//!   cli          → argument parsing only
//!   application  → use cases (train, make a bucket public)
//!   domain       → plain structs and traits, no Burn, no I/O
//!   data         → IDX files → Burn datasets → tensor batches
//!   ml           → model, training loop, evaluation maths
//!   infra        → checkpoints, experiment tracker, Cloud Storage client

pub mod cli;
pub mod application;
pub mod domain;
pub mod data;
pub mod ml;
pub mod infra;

/// Install the global tracing subscriber used by both binaries.
/// `RUST_LOG` overrides the default `cnn_mnist=info` filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cnn_mnist=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
