//! Anisotropic power reduction
//!
//! Collapses each voxel's fitted SH coefficients to one scalar: the sum
//! over even degrees >= 2 of the mean coefficient magnitude raised to a
//! power, log-shifted against a reference level. The degree-0 term is the
//! isotropic mean and is excluded, it carries no anisotropy information.

use ndarray::{Array1, ArrayView2, Zip};

use crate::config::PowerMapConfig;
use crate::shm::n_coefficients;

/// Reduce fitted coefficients to one non-negative scalar per voxel.
///
/// `coeffs` holds one voxel per row, columns laid out by
/// [`crate::shm::sh_index_list`] for `sh_order`. For each even degree
/// `n >= 2` the mean of `|c|^power` over the degree's `2n + 1` columns is
/// accumulated; the sum `ap` maps to `ln(ap) - ln(norm_factor)` where
/// positive and to zero otherwise. With `non_negative` set, negative
/// residuals of the log shift clip to zero; the clip applies to the final
/// scalar only.
pub fn anisotropic_power(
    coeffs: ArrayView2<f64>,
    sh_order: usize,
    config: &PowerMapConfig,
) -> Array1<f64> {
    debug_assert_eq!(coeffs.ncols(), n_coefficients(sh_order));

    let log_norm = config.norm_factor.ln();
    let power = config.power;

    let mut out = Array1::zeros(coeffs.nrows());
    Zip::from(&mut out).and(coeffs.rows()).par_for_each(|o, row| {
        let mut ap = 0.0;
        let mut start = 1;
        for n in (2..=sh_order).step_by(2) {
            let width = 2 * n + 1;
            let band = row.slice(ndarray::s![start..start + width]);
            ap += band.iter().map(|c| c.abs().powi(power)).sum::<f64>() / width as f64;
            start += width;
        }

        let mut value = if ap > 0.0 { ap.ln() - log_norm } else { 0.0 };
        if config.non_negative && value < 0.0 {
            value = 0.0;
        }
        *o = value;
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn config() -> PowerMapConfig {
        PowerMapConfig::default()
    }

    #[test]
    fn test_zero_coefficients_give_zero() {
        let coeffs = Array2::zeros((3, 6));
        let power = anisotropic_power(coeffs.view(), 2, &config());
        assert_eq!(power, Array1::zeros(3));
    }

    #[test]
    fn test_isotropic_coefficients_give_zero() {
        // Only the degree-0 term is set; it must not contribute.
        let mut coeffs = Array2::zeros((1, 6));
        coeffs[[0, 0]] = 7.3;
        let power = anisotropic_power(coeffs.view(), 2, &config());
        assert_eq!(power[0], 0.0);
    }

    #[test]
    fn test_known_degree2_value() {
        // All five degree-2 coefficients at 0.1: ap = 0.01, and the map is
        // ln(0.01) - ln(1e-5) = ln(1000).
        let mut coeffs = Array2::zeros((1, 6));
        for c in 1..6 {
            coeffs[[0, c]] = 0.1;
        }
        let power = anisotropic_power(coeffs.view(), 2, &config());
        assert!((power[0] - 1000.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_per_degree_averaging() {
        // One degree-2 coefficient at 0.1 among five columns: the band
        // mean divides its square by 5.
        let mut coeffs = Array2::zeros((1, 6));
        coeffs[[0, 3]] = 0.1;
        let power = anisotropic_power(coeffs.view(), 2, &config());
        let expected = (0.01_f64 / 5.0).ln() - 1e-5_f64.ln();
        assert!((power[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_degree_bands_accumulate() {
        let mut coeffs = Array2::zeros((1, 15));
        for c in 1..6 {
            coeffs[[0, c]] = 0.1; // degree 2 band
        }
        for c in 6..15 {
            coeffs[[0, c]] = 0.2; // degree 4 band
        }
        let power = anisotropic_power(coeffs.view(), 4, &config());
        let expected = (0.01_f64 + 0.04).ln() - 1e-5_f64.ln();
        assert!((power[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_non_negative_clip() {
        // Near-zero anisotropy lands below the reference level; the log
        // shift goes negative and clips at zero.
        let mut coeffs = Array2::zeros((1, 6));
        coeffs[[0, 2]] = 1e-10;
        let clipped = anisotropic_power(coeffs.view(), 2, &config());
        assert_eq!(clipped[0], 0.0);

        let mut cfg = config();
        cfg.non_negative = false;
        let raw = anisotropic_power(coeffs.view(), 2, &cfg);
        assert!(raw[0] < 0.0);
    }

    #[test]
    fn test_norm_factor_shift() {
        let mut coeffs = Array2::zeros((1, 6));
        for c in 1..6 {
            coeffs[[0, c]] = 0.5;
        }
        let mut cfg = config();
        cfg.norm_factor = 0.25;
        let power = anisotropic_power(coeffs.view(), 2, &cfg);
        assert!((power[0] - (0.25_f64.ln() - 0.25_f64.ln())).abs() < 1e-12);
        assert_eq!(power[0], 0.0);
    }

    #[test]
    fn test_power_exponent() {
        let mut coeffs = Array2::zeros((1, 6));
        for c in 1..6 {
            coeffs[[0, c]] = -0.5; // sign drops under |c|^power
        }
        let mut cfg = config();
        cfg.power = 4;
        let power = anisotropic_power(coeffs.view(), 2, &cfg);
        let expected = 0.5_f64.powi(4).ln() - 1e-5_f64.ln();
        assert!((power[0] - expected).abs() < 1e-12);
    }
}
