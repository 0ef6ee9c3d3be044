//! Small GEMM wrapper used by batched forward/backward passes.
//!
//! This module provides a single abstraction over matrix multiplication:
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature
//!
//! Computes `C = alpha * A B + beta * C` where each operand is addressed
//! through (row stride, column stride) pairs, so callers can multiply by a
//! transpose without materializing it.

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    beta: f64,
    c: &mut [f64],
    rsc: usize,
    csc: usize,
) {
    debug_assert!(m > 0 && n > 0 && k > 0);

    // Bounds are validated by callers in performance-sensitive code.
    // Keep this function minimal and inlineable.

    #[cfg(feature = "matrixmultiply")]
    unsafe {
        matrixmultiply::dgemm(
            m,
            k,
            n,
            alpha,
            a.as_ptr(),
            rsa as isize,
            csa as isize,
            b.as_ptr(),
            rsb as isize,
            csb as isize,
            beta,
            c.as_mut_ptr(),
            rsc as isize,
            csc as isize,
        );
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f64;
            let a0 = i * rsa;
            let b0 = j * csb;

            for p in 0..k {
                let av = a[a0 + p * csa];
                let bv = b[p * rsb + b0];
                acc = av.mul_add(bv, acc);
            }

            let idx = i * rsc + j * csc;
            c[idx] = alpha * acc + beta * c[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemm_multiplies_row_major_matrices() {
        // A (2x3) @ B (3x2)
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut c = [0.0; 4];

        gemm_f64(2, 2, 3, 1.0, &a, 3, 1, &b, 2, 1, 0.0, &mut c, 2, 1);

        assert_eq!(c, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn gemm_transposes_via_strides() {
        // A (2x3) @ A^T (3x2) using swapped strides for the B operand.
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut c = [0.0; 4];

        gemm_f64(2, 2, 3, 1.0, &a, 3, 1, &a, 1, 3, 0.0, &mut c, 2, 1);

        assert_eq!(c, [14.0, 32.0, 32.0, 77.0]);
    }

    #[test]
    fn gemm_accumulates_with_beta() {
        let a = [1.0, 0.0, 0.0, 1.0];
        let b = [2.0, 3.0, 4.0, 5.0];
        let mut c = [10.0, 10.0, 10.0, 10.0];

        gemm_f64(2, 2, 2, -1.0, &a, 2, 1, &b, 2, 1, 1.0, &mut c, 2, 1);

        assert_eq!(c, [8.0, 7.0, 6.0, 5.0]);
    }
}
