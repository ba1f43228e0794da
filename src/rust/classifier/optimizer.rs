use ndarray::{Array1, Array2, Zip};

use super::model::Dense;

/// RMSprop: keeps a moving average of squared gradients per parameter and
/// scales each update by its root.
///
/// `v = rho * v + (1 - rho) * g²`, `w -= lr * g / (√v + epsilon)`
#[derive(Debug, Clone)]
pub struct RmsProp {
    pub learning_rate: f32,
    pub rho: f32,
    pub epsilon: f32,
    slots: Vec<(Array2<f32>, Array1<f32>)>,
}

impl RmsProp {
    pub fn new(learning_rate: f32, layers: &[Dense]) -> Self {
        Self {
            learning_rate,
            rho: 0.9,
            epsilon: 1e-7,
            slots: layers
                .iter()
                .map(|l| (Array2::zeros(l.weights.raw_dim()), Array1::zeros(l.bias.raw_dim())))
                .collect(),
        }
    }

    /// Applies one update. `gradients[i]` holds the weight and bias
    /// gradients of `layers[i]`.
    pub fn step(&mut self, layers: &mut [Dense], gradients: &[(Array2<f32>, Array1<f32>)]) {
        let (lr, rho, eps) = (self.learning_rate, self.rho, self.epsilon);
        for ((layer, (grad_w, grad_b)), (slot_w, slot_b)) in
            layers.iter_mut().zip(gradients).zip(self.slots.iter_mut())
        {
            Zip::from(&mut layer.weights)
                .and(slot_w)
                .and(grad_w)
                .for_each(|w, v, &g| update(w, v, g, lr, rho, eps));
            Zip::from(&mut layer.bias)
                .and(slot_b)
                .and(grad_b)
                .for_each(|b, v, &g| update(b, v, g, lr, rho, eps));
        }
    }
}

#[inline]
fn update(param: &mut f32, avg: &mut f32, grad: f32, lr: f32, rho: f32, eps: f32) {
    *avg = rho * *avg + (1.0 - rho) * grad * grad;
    *param -= lr * grad / (avg.sqrt() + eps);
}
