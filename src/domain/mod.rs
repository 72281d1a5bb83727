// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits shared by the other
// layers.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O or network calls
//
// The training side and the bucket side meet only here, and
// only because both happen to need a couple of plain types.

// Values logged to the experiment tracker, run summaries
pub mod record;

// Cloud Storage IAM policy document
pub mod iam;

// Seams implemented by the infra layer
pub mod traits;
