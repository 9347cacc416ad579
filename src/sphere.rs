//! Hemisphere projection of diffusion gradient directions
//!
//! Gradient directions are acquired without sign resolution, so a direction
//! and its antipode measure the same signal. Directions are folded onto the
//! upper hemisphere before their angular coordinates are taken.

use crate::error::PowerMapError;
use crate::shm::n_coefficients;

/// Angular coordinates of a unit direction.
///
/// `theta` is the polar angle from the +z pole in `[0, pi]`, `phi` the
/// azimuth from `atan2` in `(-pi, pi]`. The azimuth convention is
/// interchangeable with `[0, 2*pi)` under `sin(m*phi)` / `cos(m*phi)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalCoords {
    pub theta: f64,
    pub phi: f64,
}

/// Fold directions onto the upper hemisphere and take their angles.
///
/// A direction with negative z is replaced by its antipode. Fails when a
/// direction has zero or non-finite length, or when fewer directions are
/// present than the SH basis for `sh_order` has functions, in which case
/// the least-squares fit would be underdetermined.
pub fn project_to_hemisphere(
    directions: &[[f64; 3]],
    sh_order: usize,
) -> Result<Vec<SphericalCoords>, PowerMapError> {
    let needed = n_coefficients(sh_order);
    if directions.len() < needed {
        return Err(PowerMapError::DegenerateDirectionSet(format!(
            "{} directions cannot determine the {} coefficients of an order-{} fit",
            directions.len(),
            needed,
            sh_order
        )));
    }

    directions
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            if !norm.is_finite() || norm < f64::EPSILON {
                return Err(PowerMapError::DegenerateDirectionSet(format!(
                    "direction {i} has zero or non-finite length"
                )));
            }
            let mut v = [d[0] / norm, d[1] / norm, d[2] / norm];
            if v[2] < 0.0 {
                v = [-v[0], -v[1], -v[2]];
            }
            Ok(SphericalCoords {
                theta: v[2].clamp(-1.0, 1.0).acos(),
                phi: v[1].atan2(v[0]),
            })
        })
        .collect()
}
