// ============================================================
// Layer 1 - CLI Arguments
// ============================================================
// The training driver takes exactly three keyword flags:
// --lr, --batch-size and --epochs. Everything else about a run
// (data path, model path, tracker project) is fixed in
// TrainConfig::default().
//
// The bucket helper takes a bucket name and the principals that
// should be granted read access.

use clap::Args;

use crate::application::public_bucket_use_case::{
    PublicBucketRequest, DEFAULT_BUCKET, DEFAULT_MEMBER,
};
use crate::application::train_use_case::TrainConfig;

/// Hyperparameters for one training run.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Learning rate for the Adam optimiser
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Number of images per gradient step
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Number of full passes over the training split
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,
}

/// The application layer never sees clap types: CLI args are
/// folded into the default config here.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            lr:         a.lr,
            batch_size: a.batch_size,
            epochs:     a.epochs,
            ..TrainConfig::default()
        }
    }
}

/// Arguments for granting public read access on a bucket.
#[derive(Args, Debug, Clone)]
pub struct BucketArgs {
    /// Name of the Cloud Storage bucket
    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket_name: String,

    /// Principal to grant objectViewer to (repeatable)
    #[arg(long = "member", default_value = DEFAULT_MEMBER)]
    pub members: Vec<String>,
}

impl From<BucketArgs> for PublicBucketRequest {
    fn from(a: BucketArgs) -> Self {
        PublicBucketRequest {
            bucket_name: a.bucket_name,
            members:     a.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{BucketCli, Cli};
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["cnn-mnist"]).unwrap();
        let cfg: TrainConfig = cli.args.into();
        assert_eq!(cfg.lr, 1e-3);
        assert_eq!(cfg.batch_size, 32);
        assert_eq!(cfg.epochs, 10);
    }

    #[test]
    fn test_train_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "cnn-mnist", "--lr", "0.01", "--batch-size", "64", "--epochs", "3",
        ])
        .unwrap();
        let cfg: TrainConfig = cli.args.into();
        assert_eq!(cfg.lr, 0.01);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.epochs, 3);
        // Fixed fields keep their defaults
        assert_eq!(cfg.data_dir, TrainConfig::default().data_dir);
    }

    #[test]
    fn test_train_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["cnn-mnist", "--data-dir", "x"]).is_err());
        assert!(Cli::try_parse_from(["cnn-mnist", "train"]).is_err());
    }

    #[test]
    fn test_bucket_defaults_and_repeated_members() {
        let cli = BucketCli::try_parse_from(["public-bucket"]).unwrap();
        let req: PublicBucketRequest = cli.args.into();
        assert_eq!(req.bucket_name, DEFAULT_BUCKET);
        assert_eq!(req.members, vec![DEFAULT_MEMBER.to_string()]);

        let cli = BucketCli::try_parse_from([
            "public-bucket",
            "--bucket-name", "my-bucket",
            "--member", "allUsers",
            "--member", "user:someone@example.com",
        ])
        .unwrap();
        let req: PublicBucketRequest = cli.args.into();
        assert_eq!(req.bucket_name, "my-bucket");
        assert_eq!(req.members.len(), 2);
    }
}
