// ============================================================
// Layer 3 - Core Traits
// ============================================================
// The two seams where the application layer talks to the
// outside world. Production implementations live in infra;
// tests swap in in-memory ones.

use anyhow::Result;

use crate::domain::iam::IamPolicy;
use crate::domain::record::{LoggedValue, RunSummary};

// ─── ExperimentTracker ────────────────────────────────────────────────────────
/// Records run configuration, metrics and a final summary.
///
/// Implementations:
///   - LocalTracker  → run directory with metrics.jsonl
///   - RemoteTracker → LocalTracker mirrored to an HTTP endpoint
pub trait ExperimentTracker {
    /// Identifier of the current run
    fn run_id(&self) -> &str;

    /// Append one entry to the metrics log and return its step.
    fn log(&mut self, values: Vec<(String, LoggedValue)>) -> Result<u64>;

    /// Record the end-of-run summary. Called once.
    fn finish(&mut self, summary: &RunSummary) -> Result<()>;
}

// ─── IamPolicyStore ───────────────────────────────────────────────────────────
/// Reads and writes the IAM policy of a storage bucket.
pub trait IamPolicyStore {
    fn get_iam_policy(&self, bucket: &str, requested_policy_version: u32) -> Result<IamPolicy>;

    /// Replace the bucket's policy; returns the policy as stored.
    fn set_iam_policy(&self, bucket: &str, policy: &IamPolicy) -> Result<IamPolicy>;
}
