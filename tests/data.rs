// Regression check on the processed corrupted MNIST files.
// Skipped when `data/processed` has not been generated.

use std::path::Path;

use burn::data::dataset::Dataset;
use cnn_mnist::data::dataset::{corrupt_mnist_default, CorruptMnistDataset, DEFAULT_DATA_DIR, NUM_CLASSES};

const N_TRAIN: usize = 30_000;
const N_TEST: usize = 5_000;

fn check_split(set: &CorruptMnistDataset) {
    for item in set.items() {
        assert_eq!(item.shape(), [1, 28, 28]);
        assert!((item.label as usize) < NUM_CLASSES);
    }
    let expected: Vec<u8> = (0..NUM_CLASSES as u8).collect();
    assert_eq!(
        set.distinct_labels().into_iter().collect::<Vec<_>>(),
        expected,
        "{} split is missing classes",
        set.split()
    );
}

#[test]
fn test_data() {
    if !Path::new(DEFAULT_DATA_DIR).exists() {
        eprintln!("Data files not found, skipping");
        return;
    }

    let (train, test) = corrupt_mnist_default().unwrap();
    assert_eq!(train.len(), N_TRAIN, "Dataset did not have the correct number of samples");
    assert_eq!(test.len(), N_TEST, "Dataset did not have the correct number of samples");

    check_split(&train);
    check_split(&test);
}
