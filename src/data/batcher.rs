// ============================================================
// Layer 4 - MNIST Batcher
// ============================================================
// Implements Burn's Batcher trait: turns a Vec<MnistItem> into
// one MnistBatch on the requested device.
//
//   images  [N, 1, 28, 28]  normalised with the MNIST mean/std
//   targets [N]             class indices
//
// The batcher is stateless; the DataLoader passes the device.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::dataset::{MnistItem, CHANNELS, HEIGHT, WIDTH};

/// Mean and standard deviation of MNIST pixel intensities in [0, 1]
pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD: f32 = 0.3081;

#[derive(Clone, Debug)]
pub struct MnistBatch<B: Backend> {
    pub images:  Tensor<B, 4>,
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug, Default)]
pub struct MnistBatcher {}

impl<B: Backend> Batcher<B, MnistItem, MnistBatch<B>> for MnistBatcher {
    fn batch(&self, items: Vec<MnistItem>, device: &B::Device) -> MnistBatch<B> {
        let images = items
            .iter()
            .map(|item| TensorData::from(item.image).convert::<B::FloatElem>())
            .map(|data| Tensor::<B, 2>::from_data(data, device))
            .map(|tensor| tensor.reshape([1, CHANNELS, HEIGHT, WIDTH]))
            .map(|tensor| (tensor - MNIST_MEAN) / MNIST_STD)
            .collect();

        let targets = items
            .iter()
            .map(|item| {
                Tensor::<B, 1, Int>::from_data([(item.label as i64).elem::<B::IntElem>()], device)
            })
            .collect();

        let images = Tensor::cat(images, 0);
        let targets = Tensor::cat(targets, 0);

        MnistBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn item(value: f32, label: u8) -> MnistItem {
        MnistItem { image: [[value; WIDTH]; HEIGHT], label }
    }

    #[test]
    fn test_batch_shapes_and_targets() {
        let device = Default::default();
        let batch: MnistBatch<TestBackend> =
            MnistBatcher::default().batch(vec![item(0.0, 3), item(1.0, 7), item(0.5, 0)], &device);

        assert_eq!(batch.images.dims(), [3, 1, 28, 28]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![3, 7, 0]);
    }

    #[test]
    fn test_images_are_normalised() {
        let device = Default::default();
        let batch: MnistBatch<TestBackend> =
            MnistBatcher::default().batch(vec![item(MNIST_MEAN, 1)], &device);

        let values: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec().unwrap();
        assert!(values.iter().all(|v| v.abs() < 1e-5));
    }
}
