use std::path::Path;

use burn::module::AutodiffModule;
use burn::nn::loss::{HuberLossConfig, Reduction};
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::TensorData;

use crate::ai::estimator::{PersistentEstimator, ValueEstimator, ValueTable};
use crate::ai::networks::{QNetwork, QNetworkConfig};
use crate::ai::state_encoding::{action_mask, encode_observation, encode_observations_batch};
use crate::error::CheckpointError;
use crate::game::{BoardDims, Observation};

const WEIGHTS_FILE: &str = "q_network";

/// Optimizer and network settings for [`BurnEstimator`].
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    pub learning_rate: f64,
    pub weight_decay: f32,
    pub hidden_size: usize,
    pub dropout: f64,
    pub huber_delta: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            learning_rate: 1e-3,
            weight_decay: 1e-4,
            hidden_size: 512,
            dropout: 0.3,
            huber_delta: 1.0,
        }
    }
}

/// [`ValueEstimator`] backed by a burn [`QNetwork`] trained with Adam on a
/// Huber loss. The device is fixed at construction.
pub struct BurnEstimator<B: AutodiffBackend> {
    network: QNetwork<B>,
    optimizer: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    net_config: QNetworkConfig,
    config: EstimatorConfig,
    dims: BoardDims,
    device: B::Device,
}

impl<B: AutodiffBackend> BurnEstimator<B> {
    pub fn new(dims: BoardDims, config: EstimatorConfig, device: B::Device) -> Self {
        let net_config = QNetworkConfig::new(dims.rows, dims.cols)
            .with_hidden_size(config.hidden_size)
            .with_dropout(config.dropout);
        let network = net_config.init(&device);
        let optimizer = AdamConfig::new()
            .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay)))
            .init();

        BurnEstimator {
            network,
            optimizer,
            net_config,
            config,
            dims,
            device,
        }
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Inference without autodiff tracking; dropout is inactive here.
    fn forward_inference(&self, input: Tensor<B::InnerBackend, 4>) -> Vec<f32> {
        self.network
            .valid()
            .forward(input)
            .into_data()
            .to_vec()
            .expect("f32 tensor data extraction")
    }

    fn tables_from_flat(&self, flat: &[f32]) -> Vec<ValueTable> {
        flat.chunks_exact(self.dims.num_actions())
            .filter_map(|chunk| ValueTable::new(self.dims, chunk.to_vec()))
            .collect()
    }
}

impl<B: AutodiffBackend> ValueEstimator for BurnEstimator<B> {
    fn dims(&self) -> BoardDims {
        self.dims
    }

    fn evaluate(&self, observation: &Observation) -> ValueTable {
        let input = encode_observation::<B::InnerBackend>(observation, &self.device).unsqueeze::<4>();
        let flat = self.forward_inference(input);
        let mut tables = self.tables_from_flat(&flat);
        tables.pop().unwrap_or_else(|| {
            ValueTable::new(self.dims, vec![0.0; self.dims.num_actions()])
                .expect("zero table matches dims")
        })
    }

    fn evaluate_batch(&self, observations: &[&Observation]) -> Vec<ValueTable> {
        if observations.is_empty() {
            return Vec::new();
        }
        let input = encode_observations_batch::<B::InnerBackend>(observations, &self.device);
        let flat = self.forward_inference(input);
        self.tables_from_flat(&flat)
    }

    fn apply_gradient_step(
        &mut self,
        states: &[&Observation],
        action_indices: &[usize],
        targets: &[f32],
    ) -> f32 {
        let batch_size = states.len();
        if batch_size == 0 {
            return 0.0;
        }

        // Q(s, a) = sum(q_all * mask, dim=1) -> [B, 1]
        let state_tensors = encode_observations_batch::<B>(states, &self.device);
        let q_all = self.network.forward(state_tensors);
        let mask = action_mask::<B>(action_indices, self.dims.cells(), &self.device);
        let q_taken = (q_all * mask).sum_dim(1);

        let targets = Tensor::<B, 1>::from_data(TensorData::from(targets), &self.device)
            .reshape([batch_size, 1]);

        let loss = HuberLossConfig::new(self.config.huber_delta)
            .init()
            .forward(q_taken, targets, Reduction::Mean);

        let loss_val: f32 = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .expect("f32 loss tensor extraction")[0];

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.config.learning_rate, self.network.clone(), grads);

        loss_val
    }

    fn snapshot_parameters_from(&mut self, other: &Self) {
        self.network = other.network.clone();
    }
}

impl<B: AutodiffBackend> PersistentEstimator for BurnEstimator<B> {
    /// Save network weights to a directory.
    fn save_to_dir(&self, dir: &Path) -> Result<(), CheckpointError> {
        std::fs::create_dir_all(dir)?;
        let recorder = DefaultRecorder::default();
        self.network
            .clone()
            .save_file(dir.join(WEIGHTS_FILE), &recorder)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))
    }

    /// Load network weights from a directory. Optimizer state starts fresh.
    fn load_from_dir(&mut self, dir: &Path) -> Result<(), CheckpointError> {
        let recorder = DefaultRecorder::default();
        let network: QNetwork<B> = self
            .net_config
            .init(&self.device)
            .load_file(dir.join(WEIGHTS_FILE), &recorder, &self.device)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;
        self.network = network;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ActionKind, Coord};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn small_config() -> EstimatorConfig {
        EstimatorConfig {
            hidden_size: 16,
            ..Default::default()
        }
    }

    fn estimator() -> BurnEstimator<TestBackend> {
        BurnEstimator::new(BoardDims::new(3, 3), small_config(), Default::default())
    }

    fn board(seed: f32) -> Observation {
        let cells = (0..9).map(|i| ((i as f32) * seed).sin()).collect();
        Observation::new(BoardDims::new(3, 3), cells).unwrap()
    }

    #[test]
    fn test_evaluate_shape() {
        let est = estimator();
        let table = est.evaluate(&board(0.3));
        assert_eq!(table.as_slice().len(), 18);
        assert_eq!(table.dims(), BoardDims::new(3, 3));
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let est = estimator();
        let obs = board(0.7);
        assert_eq!(est.evaluate(&obs), est.evaluate(&obs));
    }

    #[test]
    fn test_batch_matches_single() {
        let est = estimator();
        let a = board(0.1);
        let b = board(0.9);
        let batch = est.evaluate_batch(&[&a, &b]);
        assert_eq!(batch.len(), 2);
        for (single, batched) in [est.evaluate(&a), est.evaluate(&b)].iter().zip(&batch) {
            for (x, y) in single.as_slice().iter().zip(batched.as_slice()) {
                assert!((x - y).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_gradient_step_moves_towards_target() {
        let mut est = BurnEstimator::<TestBackend>::new(
            BoardDims::new(3, 3),
            EstimatorConfig {
                hidden_size: 16,
                dropout: 0.0,
                learning_rate: 1e-2,
                ..Default::default()
            },
            Default::default(),
        );
        let obs = board(0.5);
        let dims = BoardDims::new(3, 3);
        let action = dims
            .action_index(&crate::game::Action::new(Coord::new(2, 1), ActionKind::Flag))
            .unwrap();
        let target = 3.0;

        let before = est.evaluate(&obs).as_slice()[action];
        let first_loss = est.apply_gradient_step(&[&obs], &[action], &[target]);
        for _ in 0..30 {
            est.apply_gradient_step(&[&obs], &[action], &[target]);
        }
        let after = est.evaluate(&obs).as_slice()[action];

        assert!(first_loss > 0.0);
        assert!(
            (after - target).abs() < (before - target).abs(),
            "before {before}, after {after}"
        );
    }

    #[test]
    fn test_snapshot_copies_parameters() {
        let mut policy = estimator();
        let mut target = estimator();
        let obs = board(0.2);
        assert_ne!(policy.evaluate(&obs), target.evaluate(&obs));

        target.snapshot_parameters_from(&policy);
        assert_eq!(policy.evaluate(&obs), target.evaluate(&obs));

        // Training the policy leaves the snapshot alone.
        let frozen = target.evaluate(&obs);
        policy.apply_gradient_step(&[&obs], &[0], &[10.0]);
        assert_eq!(target.evaluate(&obs), frozen);
        assert_ne!(policy.evaluate(&obs), frozen);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let est = estimator();
        est.save_to_dir(dir.path()).unwrap();

        let mut restored = estimator();
        restored.load_from_dir(dir.path()).unwrap();
        let obs = board(0.4);
        let a = est.evaluate(&obs);
        let b = restored.evaluate(&obs);
        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            assert!((x - y).abs() < 1e-5);
        }
    }
}
