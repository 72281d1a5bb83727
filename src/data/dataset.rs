// ============================================================
// Layer 4 - Corrupted MNIST Dataset
// ============================================================
// Loads one split (train or test) from IDX files and exposes it
// through Burn's Dataset trait.
//
// Expected layout inside the data directory:
//
//   data/processed/
//     train_images.idx     [N, 28, 28]
//     train_target.idx     [N]
//     test_images.idx
//     test_target.idx
//
// When `train_images.idx` is missing the loader falls back to
// numbered shards (train_images_0.idx, train_images_1.idx, ...)
// and concatenates them in order. Any file may carry a `.gz`
// suffix.
//
// Every split is validated on load: 28x28 images, one label per
// image, labels in 0..=9, and at least one image of each class.

use std::{
    collections::BTreeSet,
    fmt,
    path::{Path, PathBuf},
};

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::data::{error::DataError, idx::IdxArray};

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const CHANNELS: usize = 1;
pub const NUM_CLASSES: usize = 10;

/// Where the processed tensors live when no directory is given.
pub const DEFAULT_DATA_DIR: &str = "data/processed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One image and its digit label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MnistItem {
    /// Single-channel image, intensities as stored (bytes scaled to [0, 1])
    pub image: [[f32; WIDTH]; HEIGHT],

    /// Digit class, 0..=9
    pub label: u8,
}

impl MnistItem {
    /// Tensor shape of the image: [channels, height, width]
    pub fn shape(&self) -> [usize; 3] {
        [CHANNELS, self.image.len(), self.image[0].len()]
    }
}

/// An immutable, validated split of the corrupted MNIST data.
#[derive(Debug)]
pub struct CorruptMnistDataset {
    split: Split,
    items: Vec<MnistItem>,
}

impl CorruptMnistDataset {
    /// Load `split` from `dir`.
    pub fn load(dir: impl AsRef<Path>, split: Split) -> Result<Self, DataError> {
        let dir = dir.as_ref();

        let image_files = split_files(dir, split, "images")?;
        let label_files = split_files(dir, split, "target")?;

        let mut pixels = Vec::new();
        for path in &image_files {
            let arr = IdxArray::read(path)?;
            if arr.dims.len() != 3 || arr.dims[1] != HEIGHT || arr.dims[2] != WIDTH {
                return Err(DataError::BadShape {
                    path:     path.clone(),
                    expected: format!("[N, {HEIGHT}, {WIDTH}]"),
                    found:    arr.dims,
                });
            }
            pixels.extend(arr.to_pixels());
        }

        let mut labels = Vec::new();
        for path in &label_files {
            let arr = IdxArray::read(path)?;
            if arr.dims.len() != 1 {
                return Err(DataError::BadShape {
                    path:     path.clone(),
                    expected: "[N]".to_string(),
                    found:    arr.dims,
                });
            }
            labels.extend(arr.to_labels(path)?);
        }

        let n_images = pixels.len() / (HEIGHT * WIDTH);
        if n_images != labels.len() {
            return Err(DataError::CountMismatch {
                split:  split.to_string(),
                images: n_images,
                labels: labels.len(),
            });
        }

        let mut items = Vec::with_capacity(n_images);
        for (index, (chunk, &label)) in pixels.chunks_exact(HEIGHT * WIDTH).zip(&labels).enumerate() {
            if !(0..NUM_CLASSES as i64).contains(&label) {
                return Err(DataError::LabelOutOfRange { split: split.to_string(), index, label });
            }

            let mut image = [[0f32; WIDTH]; HEIGHT];
            for (row, src) in image.iter_mut().zip(chunk.chunks_exact(WIDTH)) {
                row.copy_from_slice(src);
            }
            items.push(MnistItem { image, label: label as u8 });
        }

        let dataset = Self::from_items(split, items)?;
        tracing::info!(
            "Loaded {} split: {} images from {} file(s)",
            split,
            dataset.items.len(),
            image_files.len()
        );
        Ok(dataset)
    }

    /// Wrap already-decoded items, enforcing that every class appears.
    pub fn from_items(split: Split, items: Vec<MnistItem>) -> Result<Self, DataError> {
        let dataset = Self { split, items };

        let present = dataset.distinct_labels();
        let missing: Vec<u8> = (0..NUM_CLASSES as u8).filter(|c| !present.contains(c)).collect();
        if !missing.is_empty() {
            return Err(DataError::MissingClasses { split: split.to_string(), missing });
        }

        Ok(dataset)
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn items(&self) -> &[MnistItem] {
        &self.items
    }

    /// The set of labels that occur in this split
    pub fn distinct_labels(&self) -> BTreeSet<u8> {
        self.items.iter().map(|item| item.label).collect()
    }
}

impl Dataset<MnistItem> for CorruptMnistDataset {
    fn get(&self, index: usize) -> Option<MnistItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Load both splits from `dir`.
pub fn corrupt_mnist(
    dir: impl AsRef<Path>,
) -> Result<(CorruptMnistDataset, CorruptMnistDataset), DataError> {
    let dir = dir.as_ref();
    let train = CorruptMnistDataset::load(dir, Split::Train)?;
    let test = CorruptMnistDataset::load(dir, Split::Test)?;
    Ok((train, test))
}

/// Load both splits from the fixed default location.
pub fn corrupt_mnist_default() -> Result<(CorruptMnistDataset, CorruptMnistDataset), DataError> {
    corrupt_mnist(DEFAULT_DATA_DIR)
}

/// Files holding `kind` ("images" or "target") for `split`: either the
/// single file or the run of numbered shards starting at 0.
fn split_files(dir: &Path, split: Split, kind: &str) -> Result<Vec<PathBuf>, DataError> {
    if let Some(single) = existing(dir, &format!("{split}_{kind}")) {
        return Ok(vec![single]);
    }

    let shards: Vec<PathBuf> = (0..)
        .map(|i| existing(dir, &format!("{split}_{kind}_{i}")))
        .take_while(Option::is_some)
        .flatten()
        .collect();

    if shards.is_empty() {
        return Err(DataError::MissingSplit {
            split: format!("{split}_{kind}"),
            dir:   dir.to_path_buf(),
        });
    }
    Ok(shards)
}

fn existing(dir: &Path, stem: &str) -> Option<PathBuf> {
    ["idx", "idx.gz"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|p| p.is_file())
}
