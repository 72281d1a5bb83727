// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Workflow coordination only: no tensor maths, no printing, no
// direct file or network access.

// Training the CNN
pub mod train_use_case;

// Granting public read access on a bucket
pub mod public_bucket_use_case;
