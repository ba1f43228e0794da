use ndarray::{s, Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::optimizer::RmsProp;
use super::utils::{argmax, relu, softmax};

/// Clip applied to probabilities before taking their logarithm.
const PROBABILITY_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Softmax,
}

/// Fully connected layer computing `activation(x · weights + bias)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    /// Kernel of shape `[inputs, units]`
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    pub activation: Activation,
}

impl Dense {
    /// Creates a layer with Glorot-uniform weights and zero bias.
    pub fn new(inputs: usize, units: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        Self {
            weights: Array2::from_shape_fn((inputs, units), |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(units),
            activation,
        }
    }

    pub fn units(&self) -> usize {
        self.bias.len()
    }

    fn pre_activation(&self, input: &ArrayView2<f32>) -> Array2<f32> {
        input.dot(&self.weights) + &self.bias
    }

    fn activate(&self, z: &Array2<f32>) -> Array2<f32> {
        match self.activation {
            Activation::Relu => relu(z),
            Activation::Softmax => softmax(z),
        }
    }
}

/// Loss and correct-prediction count over a set of rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchStats {
    pub loss_sum: f32,
    pub correct: usize,
    pub samples: usize,
}

impl BatchStats {
    pub fn merge(&mut self, other: BatchStats) {
        self.loss_sum += other.loss_sum;
        self.correct += other.correct;
        self.samples += other.samples;
    }

    pub fn loss(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.loss_sum / self.samples as f32
        }
    }

    pub fn accuracy(&self) -> f32 {
        if self.samples == 0 {
            0.0
        } else {
            self.correct as f32 / self.samples as f32
        }
    }
}

/// Feed-forward network: ReLU hidden layers followed by a softmax output
/// layer, trained with categorical cross-entropy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NetworkState", into = "NetworkState")]
pub struct Network {
    layers: Vec<Dense>,
}

#[derive(Serialize, Deserialize)]
struct NetworkState {
    layers: Vec<Dense>,
}

impl TryFrom<NetworkState> for Network {
    type Error = ClassifierError;

    fn try_from(state: NetworkState) -> Result<Self, Self::Error> {
        Self::from_layers(state.layers)
    }
}

impl From<Network> for NetworkState {
    fn from(network: Network) -> Self {
        Self { layers: network.layers }
    }
}

impl Network {
    /// Builds `inputs → hidden (ReLU) → outputs (softmax)` with weights drawn
    /// from `seed`.
    pub fn new(inputs: usize, hidden: usize, outputs: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let layers = vec![
            Dense::new(inputs, hidden, Activation::Relu, &mut rng),
            Dense::new(hidden, outputs, Activation::Softmax, &mut rng),
        ];
        Self { layers }
    }

    /// Checks layer shapes chain together and that only the last layer is a
    /// softmax.
    pub fn from_layers(layers: Vec<Dense>) -> Result<Self, ClassifierError> {
        let last = layers
            .last()
            .ok_or_else(|| ClassifierError::ModelError("Network has no layers".into()))?;
        if last.activation != Activation::Softmax {
            return Err(ClassifierError::ModelError("Output layer must use softmax".into()));
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.weights.ncols() != layer.bias.len() {
                return Err(ClassifierError::ModelError(format!(
                    "Layer {} has {} units but a bias of length {}",
                    i,
                    layer.weights.ncols(),
                    layer.bias.len()
                )));
            }
            if i + 1 < layers.len() && layer.activation != Activation::Relu {
                return Err(ClassifierError::ModelError(format!("Hidden layer {} must use ReLU", i)));
            }
            if i > 0 && layers[i - 1].units() != layer.weights.nrows() {
                return Err(ClassifierError::ModelError(format!(
                    "Layer {} expects {} inputs but the previous layer has {} units",
                    i,
                    layer.weights.nrows(),
                    layers[i - 1].units()
                )));
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].weights.nrows()
    }

    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].units()
    }

    /// Class probabilities for each row of `input`.
    pub fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
        let mut activation = input.to_owned();
        for layer in &self.layers {
            let z = layer.pre_activation(&activation.view());
            activation = layer.activate(&z);
        }
        activation
    }

    /// One optimizer step on a mini-batch. Returns the batch statistics
    /// computed from the forward pass before the update.
    pub fn train_batch(
        &mut self,
        input: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        optimizer: &mut RmsProp,
    ) -> BatchStats {
        let batch = input.nrows() as f32;

        // activations[0] is the input, activations[i + 1] the output of layer i
        let mut activations = vec![input.to_owned()];
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let z = layer.pre_activation(&activations[activations.len() - 1].view());
            let a = layer.activate(&z);
            pre_activations.push(z);
            activations.push(a);
        }

        let probs = &activations[activations.len() - 1];
        let stats = batch_stats(probs.view(), targets);

        // Softmax followed by cross-entropy has gradient (p - y) w.r.t. the logits.
        let mut delta = (probs - &targets) / batch;
        let mut gradients = Vec::with_capacity(self.layers.len());
        for i in (0..self.layers.len()).rev() {
            let grad_w = activations[i].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            if i > 0 {
                let mask = pre_activations[i - 1].mapv(|z| if z > 0.0 { 1.0 } else { 0.0 });
                delta = delta.dot(&self.layers[i].weights.t()) * &mask;
            }
            gradients.push((grad_w, grad_b));
        }
        gradients.reverse();

        optimizer.step(&mut self.layers, &gradients);
        stats
    }

    /// Loss and accuracy over a full set, evaluated `batch_size` rows at a time.
    pub fn evaluate(&self, input: ArrayView2<f32>, targets: ArrayView2<f32>, batch_size: usize) -> BatchStats {
        let mut total = BatchStats::default();
        let batch_size = batch_size.max(1);
        let mut start = 0;
        while start < input.nrows() {
            let end = (start + batch_size).min(input.nrows());
            let probs = self.forward(input.slice(s![start..end, ..]));
            total.merge(batch_stats(probs.view(), targets.slice(s![start..end, ..])));
            start = end;
        }
        total
    }
}

fn batch_stats(probs: ArrayView2<f32>, targets: ArrayView2<f32>) -> BatchStats {
    let mut stats = BatchStats {
        samples: probs.nrows(),
        ..Default::default()
    };
    for (p, y) in probs.rows().into_iter().zip(targets.rows()) {
        stats.loss_sum -= p
            .iter()
            .zip(y.iter())
            .map(|(&p, &y)| y * p.clamp(PROBABILITY_EPSILON, 1.0 - PROBABILITY_EPSILON).ln())
            .sum::<f32>();
        if argmax(p) == argmax(y) {
            stats.correct += 1;
        }
    }
    stats
}
