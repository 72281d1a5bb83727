// ============================================================
// Layer 5 - CNN Classifier
// ============================================================
// Three conv blocks followed by a linear head:
//
//   [N, 1, 28, 28]
//     conv 3x3 (1 → 32)   relu  maxpool 2   → [N, 32, 13, 13]
//     conv 3x3 (32 → 64)  relu  maxpool 2   → [N, 64, 5, 5]
//     conv 3x3 (64 → 128) relu  maxpool 2   → [N, 128, 1, 1]
//     flatten, dropout                      → [N, 128]
//     linear (128 → 10)                     → [N, 10] logits

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, Relu,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

// #[derive(Config)] already provides Clone + Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct CnnConfig {
    #[config(default = 10)]
    pub num_classes: usize,

    #[config(default = 0.5)]
    pub dropout: f64,
}

impl CnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Cnn<B> {
        Cnn {
            conv1:      Conv2dConfig::new([1, 32], [3, 3]).init(device),
            conv2:      Conv2dConfig::new([32, 64], [3, 3]).init(device),
            conv3:      Conv2dConfig::new([64, 128], [3, 3]).init(device),
            pool:       MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            dropout:    DropoutConfig::new(self.dropout).init(),
            fc1:        LinearConfig::new(128, self.num_classes).init(device),
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    conv1:      Conv2d<B>,
    conv2:      Conv2d<B>,
    conv3:      Conv2d<B>,
    pool:       MaxPool2d,
    dropout:    Dropout,
    fc1:        Linear<B>,
    activation: Relu,
}

impl<B: Backend> Cnn<B> {
    /// images [N, 1, 28, 28] → logits [N, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(self.activation.forward(self.conv1.forward(images)));
        let x = self.pool.forward(self.activation.forward(self.conv2.forward(x)));
        let x = self.pool.forward(self.activation.forward(self.conv3.forward(x)));

        let x: Tensor<B, 2> = x.flatten(1, 3);
        let x = self.dropout.forward(x);
        self.fc1.forward(x)
    }
}

impl<B: AutodiffBackend> Cnn<B> {
    /// Gradients of every weight and bias, flattened and concatenated.
    /// Parameters without a gradient are skipped.
    pub fn gradient_values(&self, grads: &B::Gradients) -> Vec<f32> {
        let mut out = Vec::new();

        for conv in [&self.conv1, &self.conv2, &self.conv3] {
            extend_with_grad(&mut out, conv.weight.val(), grads);
            if let Some(bias) = &conv.bias {
                extend_with_grad(&mut out, bias.val(), grads);
            }
        }

        extend_with_grad(&mut out, self.fc1.weight.val(), grads);
        if let Some(bias) = &self.fc1.bias {
            extend_with_grad(&mut out, bias.val(), grads);
        }

        out
    }
}

fn extend_with_grad<B: AutodiffBackend, const D: usize>(
    out:    &mut Vec<f32>,
    param:  Tensor<B, D>,
    grads:  &B::Gradients,
) {
    if let Some(grad) = param.grad(grads) {
        // A conversion failure only means this parameter is left out
        // of the histogram.
        if let Ok(values) = grad.into_data().convert::<f32>().to_vec::<f32>() {
            out.extend(values);
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    #[test]
    fn test_forward_output_shape() {
        let device = Default::default();
        let model: Cnn<NdArray> = CnnConfig::new().init(&device);

        let images = Tensor::<NdArray, 4>::zeros([2, 1, 28, 28], &device);
        assert_eq!(model.forward(images).dims(), [2, 10]);
    }

    #[test]
    fn test_gradient_values_cover_all_parameters() {
        type B = Autodiff<NdArray>;
        let device = Default::default();
        let model: Cnn<B> = CnnConfig::new().init(&device);

        let images = Tensor::<B, 4>::ones([2, 1, 28, 28], &device);
        let loss = model.forward(images).sum();
        let grads = loss.backward();

        let values = model.gradient_values(&grads);
        assert_eq!(values.len(), model.num_params());
        assert!(values.iter().all(|v| v.is_finite()));
    }
}
