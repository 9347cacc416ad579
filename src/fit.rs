//! Regularized least-squares SH fit
//!
//! Solves the fit through an explicit pseudo-inverse of the design matrix
//! so the whole volume reduces to one matrix multiplication. The
//! Laplace-Beltrami term penalizes each column by `(n(n+1))^2`, scaled by a
//! smoothing weight; at weight zero the solution is ordinary least squares.

use nalgebra::{Cholesky, DMatrix};
use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::PowerMapError;
use crate::shm::ShBasis;

/// Voxel rows per parallel block of the batch multiply.
const FIT_BLOCK_ROWS: usize = 2048;

/// Regularized pseudo-inverse `(Bt B + smooth * diag(L)^2)^-1 Bt` with
/// `L_j = -n_j (n_j + 1)`.
///
/// The normal matrix is factorized directly; if it is singular at
/// `smooth = 0`, the caller can recover by supplying a positive smoothing
/// weight.
pub fn regularized_pinv(basis: &ShBasis, smooth: f64) -> Result<Array2<f64>, PowerMapError> {
    let design = &basis.design;
    let ncoef = design.ncols();

    let mut normal = design.t().dot(design);
    for (j, &n) in basis.degrees.iter().enumerate() {
        let l = -n * (n + 1.0);
        normal[[j, j]] += smooth * l * l;
    }

    // ndarray iterates the owned product in row-major order.
    let m = DMatrix::from_row_iterator(ncoef, ncoef, normal.iter().copied());
    let inv = Cholesky::new(m)
        .ok_or(PowerMapError::IllConditionedBasis)?
        .inverse();
    let inv = Array2::from_shape_fn((ncoef, ncoef), |(i, j)| inv[(i, j)]);

    Ok(inv.dot(&design.t()))
}

/// Fit SH coefficients for every voxel at once.
///
/// `normalized` holds one voxel per row, one diffusion-weighted sample per
/// column; the result holds one coefficient vector per row. Rows are
/// independent, so the multiply runs over fixed-size row blocks in
/// parallel.
pub fn fit_coefficients(normalized: ArrayView2<f64>, pinv: &Array2<f64>) -> Array2<f64> {
    let ncoef = pinv.nrows();
    let pinv_t = pinv.t();
    let mut coeffs = Array2::zeros((normalized.nrows(), ncoef));

    coeffs
        .axis_chunks_iter_mut(Axis(0), FIT_BLOCK_ROWS)
        .into_par_iter()
        .zip(normalized.axis_chunks_iter(Axis(0), FIT_BLOCK_ROWS).into_par_iter())
        .for_each(|(mut out_block, in_block)| {
            general_mat_mul(1.0, &in_block, &pinv_t, 0.0, &mut out_block);
        });

    coeffs
}
