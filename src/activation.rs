//! Hidden-layer activations and the row-wise softmax used on the output layer.
//!
//! The network caches *post-activation* outputs `y` during the forward pass.
//! Backprop therefore needs each derivative expressed in terms of `y` rather
//! than the raw pre-activation `z`; both supported activations admit that
//! form (`sigmoid' = y(1-y)`, `tanh' = 1-y^2`), so no separate `z` buffer is
//! kept.

/// Element-wise hidden-layer activation function.
///
/// The output layer never uses these; it is always [`softmax_rows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    Sigmoid,
    Tanh,
}

impl Activation {
    #[inline]
    pub fn forward(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
        }
    }

    /// Derivative of the activation with respect to its input, expressed in
    /// terms of the cached post-activation output `y`.
    #[inline]
    pub fn grad_from_output(self, y: f64) -> f64 {
        match self {
            Activation::Sigmoid => y * (1.0 - y),
            Activation::Tanh => 1.0 - y * y,
        }
    }

    /// Symmetric uniform bound for weight/bias initialization of a layer
    /// with the given fan-in and fan-out.
    ///
    /// - sigmoid: `sqrt(2 / (fan_in + fan_out))`
    /// - tanh:    `sqrt(6 / (fan_in + fan_out))`
    #[inline]
    pub fn init_bound(self, fan_in: usize, fan_out: usize) -> f64 {
        let fan = (fan_in + fan_out) as f64;
        match self {
            Activation::Sigmoid => (2.0 / fan).sqrt(),
            Activation::Tanh => (6.0 / fan).sqrt(),
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    // Numerically stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Row-wise softmax over a flat row-major `(rows, cols)` matrix, in place.
///
/// Each row is shifted by its maximum before exponentiation so that large
/// logits cannot overflow; the shift cancels in the normalization and leaves
/// the result unchanged.
///
/// Shape contract: `data.len() == rows * cols`.
pub fn softmax_rows(data: &mut [f64], rows: usize, cols: usize) {
    assert_eq!(
        data.len(),
        rows * cols,
        "data len {} does not match rows * cols ({rows} * {cols})",
        data.len()
    );
    if cols == 0 {
        return;
    }

    for row in data.chunks_exact_mut(cols) {
        let mut max = row[0];
        for &v in row.iter().skip(1) {
            if v > max {
                max = v;
            }
        }

        let mut sum = 0.0_f64;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }

        let inv_sum = 1.0 / sum;
        for v in row.iter_mut() {
            *v *= inv_sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_basic_values() {
        let y0 = Activation::Sigmoid.forward(0.0);
        assert!((y0 - 0.5).abs() < 1e-12);

        assert!(Activation::Sigmoid.forward(20.0) > 0.999);
        assert!(Activation::Sigmoid.forward(-20.0) < 0.001);
    }

    #[test]
    fn derivatives_match_output_identities() {
        for &x in &[-2.0, -0.5, 0.0, 0.3, 1.7] {
            let s = Activation::Sigmoid.forward(x);
            assert!((Activation::Sigmoid.grad_from_output(s) - s * (1.0 - s)).abs() < 1e-15);

            let t = Activation::Tanh.forward(x);
            assert!((Activation::Tanh.grad_from_output(t) - (1.0 - t * t)).abs() < 1e-15);
        }

        // Sigmoid derivative peaks at 1/4.
        let s = Activation::Sigmoid.forward(0.0);
        assert!((Activation::Sigmoid.grad_from_output(s) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn init_bounds_follow_fan_sums() {
        let b = Activation::Sigmoid.init_bound(100, 50);
        assert!((b - (2.0_f64 / 150.0).sqrt()).abs() < 1e-15);

        let b = Activation::Tanh.init_bound(100, 50);
        assert!((b - (6.0_f64 / 150.0).sqrt()).abs() < 1e-15);

        // Tanh wants a wider band than sigmoid for the same fan.
        assert!(Activation::Tanh.init_bound(8, 8) > Activation::Sigmoid.init_bound(8, 8));
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let mut data = vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0];
        softmax_rows(&mut data, 2, 3);

        for row in data.chunks_exact(3) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn softmax_uniform_input_is_uniform() {
        let mut data = vec![0.5; 4];
        softmax_rows(&mut data, 1, 4);
        for &p in &data {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let mut data = vec![1000.0, 1001.0, 1002.0];
        softmax_rows(&mut data, 1, 3);
        let sum: f64 = data.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn softmax_shift_preserves_normalized_output() {
        let mut a = vec![0.2, -1.3, 0.9];
        let mut b: Vec<f64> = a.iter().map(|v| v + 5.0).collect();
        softmax_rows(&mut a, 1, 3);
        softmax_rows(&mut b, 1, 3);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }
}
