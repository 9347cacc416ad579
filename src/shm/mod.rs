//! Real spherical harmonic basis construction
//!
//! Builds the design matrix that maps SH coefficients to signal samples at
//! the acquired directions, for all even degrees up to a caller-chosen
//! order. Construction is purely geometric: it depends on the angles and
//! the order only, so one basis serves every voxel of a volume.

pub mod legendre;

use std::f64::consts::PI;

use ndarray::{Array1, Array2};

use crate::error::PowerMapError;
use crate::sphere::SphericalCoords;
use legendre::assoc_legendre;

/// Which real symmetric SH basis convention the design matrix uses.
///
/// Both span the same space of antipodally symmetric functions; they differ
/// in how the complex harmonics are combined into real ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShBasisKind {
    /// `sqrt(2) Im(Y_n^|m|)` for m > 0, `Y_n^0` for m = 0,
    /// `sqrt(2) Re(Y_n^|m|)` for m < 0.
    Descoteaux07,
    /// Legacy mrtrix convention: `Re(Y_n^|m|)` for m > 0, `Y_n^0` for
    /// m = 0, `Im(Y_n^|m|)` for m < 0, without the `sqrt(2)` factor.
    Tournier07,
}

/// Number of basis functions for an even-order symmetric expansion.
pub fn n_coefficients(sh_order: usize) -> usize {
    (sh_order + 1) * (sh_order + 2) / 2
}

/// Check that an SH order is even and within the supported range.
pub fn validate_sh_order(sh_order: usize) -> Result<(), PowerMapError> {
    if sh_order % 2 != 0 || !(2..=12).contains(&sh_order) {
        return Err(PowerMapError::InvalidShOrder(sh_order));
    }
    Ok(())
}

/// Column index pairs `(m, n)` of the symmetric basis.
///
/// Degrees run over `0, 2, .., sh_order`; within each degree the phase
/// index runs `-n ..= n`. This ordering fixes the coefficient layout for
/// the fit and the power reduction.
pub fn sh_index_list(sh_order: usize) -> Vec<(i32, i32)> {
    let mut indices = Vec::with_capacity(n_coefficients(sh_order));
    for n in (0..=sh_order as i32).step_by(2) {
        for m in -n..=n {
            indices.push((m, n));
        }
    }
    indices
}

/// SH design matrix for a fixed set of directions, plus the per-column
/// degree used to weight the Laplace-Beltrami regularizer.
#[derive(Debug, Clone)]
pub struct ShBasis {
    /// One row per direction, one column per basis function.
    pub design: Array2<f64>,
    /// Degree `n` of each column, as a float for the `-n(n+1)` weights.
    pub degrees: Array1<f64>,
}

impl ShBasis {
    /// Evaluate the basis at the given angular coordinates.
    pub fn new(angles: &[SphericalCoords], sh_order: usize, kind: ShBasisKind) -> ShBasis {
        let indices = sh_index_list(sh_order);
        let mut design = Array2::zeros((angles.len(), indices.len()));
        for (r, a) in angles.iter().enumerate() {
            for (c, &(m, n)) in indices.iter().enumerate() {
                design[[r, c]] = real_sh(kind, m, n, a.theta, a.phi);
            }
        }
        let degrees = indices.iter().map(|&(_, n)| n as f64).collect();
        ShBasis { design, degrees }
    }

    pub fn n_directions(&self) -> usize {
        self.design.nrows()
    }

    pub fn n_coefficients(&self) -> usize {
        self.design.ncols()
    }
}

/// One element of the real symmetric basis.
///
/// The complex harmonic is `Y_n^|m| = K P_n^|m|(cos theta) exp(i |m| phi)`
/// with `K = sqrt((2n+1)/(4 pi) (n-|m|)!/(n+|m|)!)`; the variant picks the
/// real combination.
fn real_sh(kind: ShBasisKind, m: i32, n: i32, theta: f64, phi: f64) -> f64 {
    let m_abs = m.unsigned_abs();
    let k = normalization(n as u32, m_abs);
    let p = assoc_legendre(n as u32, m_abs, theta.cos());
    let base = k * p;
    let (cos_m_phi, sin_m_phi) = {
        let mp = m_abs as f64 * phi;
        (mp.cos(), mp.sin())
    };
    match kind {
        ShBasisKind::Descoteaux07 => {
            if m > 0 {
                std::f64::consts::SQRT_2 * base * sin_m_phi
            } else if m < 0 {
                std::f64::consts::SQRT_2 * base * cos_m_phi
            } else {
                base
            }
        }
        ShBasisKind::Tournier07 => {
            if m > 0 {
                base * cos_m_phi
            } else if m < 0 {
                base * sin_m_phi
            } else {
                base
            }
        }
    }
}

/// `sqrt((2n+1)/(4 pi) (n-m)!/(n+m)!)` without forming the factorials.
fn normalization(n: u32, m: u32) -> f64 {
    let mut ratio = 1.0;
    for k in (n - m + 1)..=(n + m) {
        ratio /= k as f64;
    }
    ((2 * n + 1) as f64 / (4.0 * PI) * ratio).sqrt()
}
