use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{ActionKind, Observation};

/// Encode an observation as a single-channel tensor of shape `[1, rows, cols]`.
pub fn encode_observation<B: Backend>(observation: &Observation, device: &B::Device) -> Tensor<B, 3> {
    let dims = observation.dims();
    Tensor::<B, 1>::from_data(TensorData::from(observation.as_slice()), device)
        .reshape([1, dims.rows, dims.cols])
}

/// Encode several observations of the same shape as `[batch, 1, rows, cols]`.
pub fn encode_observations_batch<B: Backend>(
    observations: &[&Observation],
    device: &B::Device,
) -> Tensor<B, 4> {
    let batch_size = observations.len();
    let dims = observations
        .first()
        .map(|o| o.dims())
        .expect("batch must hold at least one observation");
    let mut flat = Vec::with_capacity(batch_size * dims.cells());
    for observation in observations {
        flat.extend_from_slice(observation.as_slice());
    }
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([batch_size, 1, dims.rows, dims.cols])
}

/// One-hot `[batch, cells * 2]` mask selecting each row's taken action.
pub fn action_mask<B: Backend>(
    action_indices: &[usize],
    cells: usize,
    device: &B::Device,
) -> Tensor<B, 2> {
    let width = cells * ActionKind::COUNT;
    let mut data = vec![0.0f32; action_indices.len() * width];
    for (i, &a) in action_indices.iter().enumerate() {
        data[i * width + a] = 1.0;
    }
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device)
        .reshape([action_indices.len(), width])
}
