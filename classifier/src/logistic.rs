use ndarray::{Array1, Array2};

/// Fit hyperparameters. Every comparison trains with these defaults;
/// per-query tuning is deliberately not exposed.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    /// L2 penalty on the weights.
    pub l2: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 500,
            learning_rate: 0.1,
            l2: 1e-3,
        }
    }
}

/// Binary linear classifier fit by batch gradient descent on the
/// log-loss. Weights start at zero, so a given (features, labels,
/// config) always produces the same model.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    weights: Array1<f32>,
    bias: f32,
}

impl LogisticModel {
    pub fn fit(features: &Array2<f32>, labels: &Array1<f32>, config: &FitConfig) -> Self {
        let n = features.nrows().max(1) as f32;
        let mut weights = Array1::<f32>::zeros(features.ncols());
        let mut bias = 0.0f32;

        for _ in 0..config.epochs {
            let logits = features.dot(&weights) + bias;
            let probs = logits.mapv(sigmoid);
            let residual = &probs - labels;

            let grad_w = features.t().dot(&residual) / n + &weights * config.l2;
            let grad_b = residual.sum() / n;

            weights.scaled_add(-config.learning_rate, &grad_w);
            bias -= config.learning_rate * grad_b;
        }

        Self { weights, bias }
    }

    /// Signed distance from the decision boundary; positive means
    /// label 1.
    pub fn decision(&self, x: &Array1<f32>) -> f32 {
        self.weights.dot(x) + self.bias
    }

    /// Predicted label. An exact zero resolves to 0, the first class.
    pub fn predict(&self, x: &Array1<f32>) -> u8 {
        if self.decision(x) > 0.0 {
            1
        } else {
            0
        }
    }
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}
