use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::types::SplitData;

/// Number of items that go to the training subset for a split fraction.
pub fn train_count(len: usize, split: f64) -> usize {
    ((len as f64 * split).floor() as usize).min(len)
}

/// Shuffle `items` with `rng` and split them into train and validation sets.
///
/// The training subset holds `floor(len * split)` items, the validation
/// subset the rest. Every item ends up in exactly one subset.
pub fn split_with_rng<T, R: Rng + ?Sized>(mut items: Vec<T>, split: f64, rng: &mut R) -> SplitData<T> {
    items.shuffle(rng);

    let num_train = train_count(items.len(), split);
    let valid = items.split_off(num_train);

    SplitData {
        train: items,
        valid,
    }
}

/// Split `items` into train and validation sets.
///
/// Without a seed the shuffle is seeded from the operating system, so every
/// run produces a different split.
pub fn split_annotations<T>(items: Vec<T>, split: f64, seed: Option<u64>) -> SplitData<T> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    split_with_rng(items, split, &mut rng)
}
