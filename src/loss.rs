//! Loss helpers.
//!
//! The only training loss is cross-entropy over softmax probabilities, with
//! an L2 penalty on the weights added by the evaluator. These are small,
//! allocation-free helpers used like:
//!
//! - run `model.forward_batch(...)` over the whole dataset
//! - compute the data term with [`cross_entropy_mean`]
//! - add `reg_lambda / 2` times [`l2_penalty`]

/// Floor applied to probabilities before taking the logarithm.
///
/// Softmax can round a row entry all the way to 0 for very confident wrong
/// predictions; flooring keeps the loss finite without changing how losses
/// compare across epochs.
pub const PROB_FLOOR: f64 = 1e-12;

/// Supported training loss. Only cross-entropy is implemented; the variant
/// exists so configurations state their loss explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LossKind {
    #[default]
    CrossEntropy,
}

/// Mean cross-entropy between predicted probabilities and one-hot targets.
///
/// Computes `-1/rows * sum(one_hot * ln(max(probs, PROB_FLOOR)))` over a
/// flat row-major `(rows, n_classes)` probability matrix.
///
/// Shape contract:
/// - `probs.len() == rows * n_classes`
/// - `one_hot.len() == probs.len()`
#[inline]
pub fn cross_entropy_mean(probs: &[f64], one_hot: &[f64], rows: usize, n_classes: usize) -> f64 {
    assert_eq!(
        probs.len(),
        rows * n_classes,
        "probs len {} does not match rows * n_classes ({rows} * {n_classes})",
        probs.len()
    );
    assert_eq!(
        one_hot.len(),
        probs.len(),
        "one_hot len {} does not match probs len {}",
        one_hot.len(),
        probs.len()
    );

    if rows == 0 {
        return 0.0;
    }

    let mut sum = 0.0_f64;
    for (&p, &t) in probs.iter().zip(one_hot) {
        if t != 0.0 {
            sum -= t * p.max(PROB_FLOOR).ln();
        }
    }
    sum / rows as f64
}

/// Sum of squared entries, for the `reg_lambda / 2 * sum(w^2)` loss term.
#[inline]
pub fn l2_penalty<'a, I>(weights: I) -> f64
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut sum = 0.0_f64;
    for block in weights {
        for &w in block {
            sum = w.mul_add(w, sum);
        }
    }
    sum
}
