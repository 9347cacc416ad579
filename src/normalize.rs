//! Per-voxel baseline normalization
//!
//! Rescales the diffusion-weighted signal by the voxel's mean baseline
//! signal, removing the arbitrary intensity scale of the acquisition. The
//! brain mask is applied here, so out-of-brain voxels contribute exactly
//! zero signal to everything downstream.

use ndarray::{Array2, Array3, Array4, Zip};

use crate::error::PowerMapError;
use crate::gradients::GradientTable;

/// Normalize the diffusion-weighted signal against the baseline mean.
///
/// Returns one row per voxel (standard C order of the spatial axes) and
/// one column per diffusion-weighted acquisition; baseline channels are
/// dropped, they carry no angular information. Voxels outside the mask,
/// and voxels whose baseline mean is zero, negative, or non-finite, come
/// out as all-zero rows rather than NaN/Inf.
pub fn normalize_signal(
    dwi: &Array4<f64>,
    mask: &Array3<bool>,
    gtab: &GradientTable,
) -> Result<Array2<f64>, PowerMapError> {
    let (nx, ny, nz, nvol) = dwi.dim();
    if mask.dim() != (nx, ny, nz) {
        return Err(PowerMapError::DimensionMismatch {
            dwi: (nx, ny, nz),
            mask: mask.dim(),
        });
    }
    if nvol != gtab.len() {
        return Err(PowerMapError::InvalidGradientTable(format!(
            "dwi volume has {} acquisitions but the gradient table has {}",
            nvol,
            gtab.len()
        )));
    }

    let b0_indices = gtab.b0_indices();
    let dwi_indices = gtab.dwi_indices();
    let n_b0 = b0_indices.len() as f64;

    let mut out = Array2::zeros((nx * ny * nz, dwi_indices.len()));
    Zip::indexed(out.rows_mut()).par_for_each(|v, mut row| {
        // Row index v runs in C order over (x, y, z).
        let i = v / (ny * nz);
        let j = v / nz % ny;
        let k = v % nz;

        if !mask[[i, j, k]] {
            return;
        }

        let mut b0_mean = 0.0;
        for &a in &b0_indices {
            b0_mean += dwi[[i, j, k, a]];
        }
        b0_mean /= n_b0;

        if !b0_mean.is_finite() || b0_mean <= 0.0 {
            return;
        }
        for (c, &a) in dwi_indices.iter().enumerate() {
            row[c] = dwi[[i, j, k, a]] / b0_mean;
        }
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn table(bvals: &[f64]) -> GradientTable {
        let bvecs = bvals
            .iter()
            .map(|&b| if b < 25.0 { [0.0; 3] } else { [0.0, 0.0, 1.0] })
            .collect();
        GradientTable::new(bvals.to_vec(), bvecs, 25.0).unwrap()
    }

    #[test]
    fn test_baseline_mean_division() {
        // Two baselines (values 2 and 4, mean 3) and two weighted samples.
        let gtab = table(&[0.0, 0.0, 1000.0, 1000.0]);
        let dwi =
            Array4::from_shape_vec((1, 1, 1, 4), vec![2.0, 4.0, 6.0, 1.5]).unwrap();
        let mask = Array3::from_elem((1, 1, 1), true);

        let normed = normalize_signal(&dwi, &mask, &gtab).unwrap();
        assert_eq!(normed.shape(), &[1, 2]);
        assert_eq!(normed[[0, 0]], 2.0);
        assert_eq!(normed[[0, 1]], 0.5);
    }

    #[test]
    fn test_scale_invariance() {
        let gtab = table(&[0.0, 1000.0, 1000.0]);
        let mask = Array3::from_elem((1, 1, 1), true);

        let dwi = Array4::from_shape_vec((1, 1, 1, 3), vec![5.0, 3.0, 7.0]).unwrap();
        let scaled = dwi.mapv(|v| v * 2.0);

        let a = normalize_signal(&dwi, &mask, &gtab).unwrap();
        let b = normalize_signal(&scaled, &mask, &gtab).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_masked_out_voxel_is_zero() {
        let gtab = table(&[0.0, 1000.0]);
        let dwi = Array4::from_elem((1, 1, 1, 2), 9.0);
        let mask = Array3::from_elem((1, 1, 1), false);

        let normed = normalize_signal(&dwi, &mask, &gtab).unwrap();
        assert_eq!(normed[[0, 0]], 0.0);
    }

    #[test]
    fn test_zero_baseline_guard() {
        let gtab = table(&[0.0, 1000.0]);
        let dwi = Array4::from_shape_vec((1, 1, 1, 2), vec![0.0, 5.0]).unwrap();
        let mask = Array3::from_elem((1, 1, 1), true);

        let normed = normalize_signal(&dwi, &mask, &gtab).unwrap();
        assert_eq!(normed[[0, 0]], 0.0);
    }

    #[test]
    fn test_nan_baseline_guard() {
        let gtab = table(&[0.0, 1000.0]);
        let dwi = Array4::from_shape_vec((1, 1, 1, 2), vec![f64::NAN, 5.0]).unwrap();
        let mask = Array3::from_elem((1, 1, 1), true);

        let normed = normalize_signal(&dwi, &mask, &gtab).unwrap();
        assert_eq!(normed[[0, 0]], 0.0);
    }

    #[test]
    fn test_voxel_row_order_matches_c_layout() {
        let gtab = table(&[0.0, 1000.0]);
        // Signal encodes the voxel coordinates so row order is observable.
        let mut dwi = Array4::zeros((2, 3, 4, 2));
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    dwi[[i, j, k, 0]] = 1.0;
                    dwi[[i, j, k, 1]] = (i * 100 + j * 10 + k) as f64;
                }
            }
        }
        let mask = Array3::from_elem((2, 3, 4), true);
        let normed = normalize_signal(&dwi, &mask, &gtab).unwrap();

        assert_eq!(normed.nrows(), 24);
        // Voxel (1, 2, 3) sits at row (1*3 + 2)*4 + 3.
        assert_eq!(normed[[(1 * 3 + 2) * 4 + 3, 0]], 123.0);
        assert_eq!(normed[[1, 0]], 1.0); // voxel (0, 0, 1)
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let gtab = table(&[0.0, 1000.0]);
        let dwi = Array4::zeros((2, 2, 2, 2));
        let mask = Array3::from_elem((2, 2, 1), true);
        let err = normalize_signal(&dwi, &mask, &gtab).unwrap_err();
        assert!(matches!(err, PowerMapError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_acquisition_count_mismatch_rejected() {
        let gtab = table(&[0.0, 1000.0, 1000.0]);
        let dwi = Array4::zeros((1, 1, 1, 2));
        let mask = Array3::from_elem((1, 1, 1), true);
        let err = normalize_signal(&dwi, &mask, &gtab).unwrap_err();
        assert!(matches!(err, PowerMapError::InvalidGradientTable(_)));
    }
}
