// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles sentence pairs and splits them into training and
// validation sets. Used only when the corpus directory has no
// explicit val.tsv — an explicit split always wins.
//
// The shuffle is seeded so a rerun with the same seed produces
// the same split; otherwise validation loss is not comparable
// across runs.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with the given seed and split into
/// (train, validation) at `train_fraction`.
pub fn split_train_val<T>(
    mut samples: Vec<T>,
    train_fraction: f64,
    seed: u64,
) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let split_at = ((total as f64) * train_fraction).round() as usize;
    let split_at = split_at.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
