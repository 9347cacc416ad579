//! End-to-end power map computation
//!
//! Chains the pipeline stages over whole arrays: normalize, project the
//! directions, build the basis and its regularized pseudo-inverse once,
//! fit every voxel in one multiply, reduce to the power scalar. Pure
//! function of its inputs; rerunning on identical inputs is bit-identical.

use log::{debug, info};
use ndarray::{Array3, Array4};

use crate::config::PowerMapConfig;
use crate::error::PowerMapError;
use crate::fit::{fit_coefficients, regularized_pinv};
use crate::gradients::GradientTable;
use crate::normalize::normalize_signal;
use crate::power::anisotropic_power;
use crate::shm::{validate_sh_order, ShBasis};
use crate::sphere::project_to_hemisphere;

/// Per-voxel power scalars paired with the spatial transform of their
/// source volume. Assembled once at the end of the pipeline.
#[derive(Debug, Clone)]
pub struct PowerMapVolume {
    pub data: Array3<f64>,
    /// Row-major 4x4 affine, copied from the mask's source header.
    pub affine: [f64; 16],
    pub voxel_size: (f64, f64, f64),
}

/// Compute the anisotropic power map for every voxel.
///
/// Preconditions (spatial co-registration, acquisition count, order range,
/// direction count) are checked before any numeric work; failures abort
/// the run. Per-voxel degeneracy (zero baseline signal) yields zero power
/// locally instead.
pub fn compute_power_map(
    dwi: &Array4<f64>,
    mask: &Array3<bool>,
    gtab: &GradientTable,
    sh_order: usize,
    config: &PowerMapConfig,
) -> Result<Array3<f64>, PowerMapError> {
    validate_sh_order(sh_order)?;

    let (nx, ny, nz, _) = dwi.dim();
    let normalized = normalize_signal(dwi, mask, gtab)?;
    debug!(
        "normalized signal: {} voxels x {} directions",
        normalized.nrows(),
        normalized.ncols()
    );

    let angles = project_to_hemisphere(&gtab.dwi_bvecs(), sh_order)?;
    let basis = ShBasis::new(&angles, sh_order, config.basis);
    let pinv = regularized_pinv(&basis, config.smooth)?;
    debug!(
        "SH basis: {} directions x {} coefficients, smooth {}",
        basis.n_directions(),
        basis.n_coefficients(),
        config.smooth
    );

    info!("fitting power map");
    let coeffs = fit_coefficients(normalized.view(), &pinv);
    let power = anisotropic_power(coeffs.view(), sh_order, config);

    Ok(power.into_shape((nx, ny, nz))?)
}

/// Package the power scalars with a spatial transform borrowed from the
/// mask's source volume. Pure construction, no computation.
pub fn assemble_volume(
    data: Array3<f64>,
    affine: [f64; 16],
    voxel_size: (f64, f64, f64),
) -> PowerMapVolume {
    PowerMapVolume {
        data,
        affine,
        voxel_size,
    }
}
