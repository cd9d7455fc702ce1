use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::*;

/// Convolutional Q-network for a `rows x cols` Minesweeper board.
///
/// ```text
/// Input:   [batch, 1, rows, cols]
/// Conv1:   1 -> 64 channels, 3x3, same padding, ReLU
/// Conv2:   64 -> 128 channels, 3x3, same padding, ReLU
/// Conv3:   128 -> 128 channels, 3x3, same padding, ReLU
/// Flatten: 128 * rows * cols
/// FC1:     -> hidden, ReLU, dropout
/// FC2:     hidden -> hidden, ReLU, dropout
/// Out:     hidden -> rows * cols * 2   (reveal/flag value per cell)
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    conv1: Conv2d<B>,
    conv2: Conv2d<B>,
    conv3: Conv2d<B>,
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    dropout: Dropout,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    pub rows: usize,
    pub cols: usize,
    #[config(default = 512)]
    pub hidden_size: usize,
    #[config(default = 0.3)]
    pub dropout: f64,
}

const CONV1_CHANNELS: usize = 64;
const CONV_CHANNELS: usize = 128;

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        let cells = self.rows * self.cols;
        QNetwork {
            conv1: Conv2dConfig::new([1, CONV1_CHANNELS], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv2: Conv2dConfig::new([CONV1_CHANNELS, CONV_CHANNELS], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            conv3: Conv2dConfig::new([CONV_CHANNELS, CONV_CHANNELS], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            fc1: LinearConfig::new(cells * CONV_CHANNELS, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            out: LinearConfig::new(self.hidden_size, cells * 2).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: `[batch, 1, rows, cols]` -> `[batch, rows * cols * 2]`.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.conv1.forward(input));
        let x = self.relu.forward(self.conv2.forward(x));
        let x = self.relu.forward(self.conv3.forward(x));

        let [batch_size, channels, rows, cols] = x.dims();
        let x = x.reshape([batch_size, channels * rows * cols]);

        let x = self.dropout.forward(self.relu.forward(self.fc1.forward(x)));
        let x = self.dropout.forward(self.relu.forward(self.fc2.forward(x)));
        self.out.forward(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_network_output_shape() {
        let device = Default::default();
        let network = QNetworkConfig::new(4, 5)
            .with_hidden_size(32)
            .init::<TestBackend>(&device);

        let input = Tensor::zeros([3, 1, 4, 5], &device);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [3, 40]);
    }

    #[test]
    fn test_network_single_input() {
        let device = Default::default();
        let network = QNetworkConfig::new(2, 2)
            .with_hidden_size(16)
            .init::<TestBackend>(&device);

        let input = Tensor::zeros([1, 1, 2, 2], &device);
        let output = network.forward(input);
        assert_eq!(output.shape().dims, [1, 8]);
    }
}
