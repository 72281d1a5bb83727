// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Two independent entry points share this layer:
//   1. `cnn-mnist`      - trains the CNN (no subcommands)
//   2. `public-bucket`  - grants public read access on a bucket
//
// Both only parse arguments and route to Layer 2.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BucketArgs, TrainArgs};

/// Training driver command line.
#[derive(Parser, Debug)]
#[command(
    name = "cnn-mnist",
    version,
    about = "Train a CNN classifier on the corrupted MNIST dataset."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: TrainArgs,
}

impl Cli {
    /// Converts the args into a TrainConfig and hands off to Layer 2.
    pub fn run(self) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        println!("Training day and night");
        tracing::info!(
            lr = self.args.lr,
            batch_size = self.args.batch_size,
            epochs = self.args.epochs,
            "Starting training"
        );

        let summary = TrainUseCase::new(self.args.into()).execute()?;

        println!(
            "Training complete. accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            summary.accuracy, summary.precision, summary.recall, summary.f1,
        );
        println!("Model saved to {}", summary.model_path);
        Ok(())
    }
}

/// Bucket helper command line.
#[derive(Parser, Debug)]
#[command(
    name = "public-bucket",
    version,
    about = "Grant public read access on a Cloud Storage bucket."
)]
pub struct BucketCli {
    #[command(flatten)]
    pub args: BucketArgs,
}

impl BucketCli {
    pub fn run(self) -> Result<()> {
        use crate::application::public_bucket_use_case::set_bucket_public_iam;
        use crate::infra::gcs::StorageClient;

        let client = StorageClient::from_env()?;
        let request = self.args.into();
        let bucket = set_bucket_public_iam(&client, &request)?;

        println!("Bucket {bucket} is now publicly readable");
        Ok(())
    }
}
