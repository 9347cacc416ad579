//! Named configuration for the power map pipeline
//!
//! Every numerical constant of the pipeline lives here with its documented
//! default, so non-default settings (a positive smoothing weight, a
//! different basis) stay reachable for callers and tests.

use crate::shm::ShBasisKind;

/// Acquisitions with a b-value below this are treated as baseline (b0).
pub const DEFAULT_B0_THRESHOLD: f64 = 25.0;

/// Reference level the per-degree power sum is measured against.
pub const DEFAULT_NORM_FACTOR: f64 = 1e-5;

/// Exponent applied to each SH coefficient magnitude before averaging.
pub const DEFAULT_POWER: i32 = 2;

/// Laplace-Beltrami smoothing weight. Zero means ordinary least squares.
pub const DEFAULT_SMOOTH: f64 = 0.0;

/// Default spherical harmonic order of the fitted signal model.
pub const DEFAULT_SH_ORDER: usize = 4;

/// Tunable parameters of the power map computation.
///
/// `Default` reproduces the standard map: b0 threshold 25, norm factor
/// 1e-5, power 2, no smoothing, non-negative output, descoteaux07 basis.
#[derive(Debug, Clone)]
pub struct PowerMapConfig {
    /// Baseline partition threshold on the b-value.
    pub b0_threshold: f64,
    /// Normalization constant of the log power transform.
    pub norm_factor: f64,
    /// Exponent on the per-coefficient magnitude.
    pub power: i32,
    /// Laplace-Beltrami regularization weight for the fit.
    pub smooth: f64,
    /// Clip the final per-voxel scalar at zero.
    pub non_negative: bool,
    /// Which real symmetric SH basis to build the design matrix with.
    pub basis: ShBasisKind,
}

impl Default for PowerMapConfig {
    fn default() -> Self {
        PowerMapConfig {
            b0_threshold: DEFAULT_B0_THRESHOLD,
            norm_factor: DEFAULT_NORM_FACTOR,
            power: DEFAULT_POWER,
            smooth: DEFAULT_SMOOTH,
            non_negative: true,
            basis: ShBasisKind::Descoteaux07,
        }
    }
}
