//! Common test utilities: synthetic gradient tables and phantom volumes

use ndarray::{Array3, Array4};

use powmap_core::gradients::GradientTable;

/// Deterministic well-spread directions on the upper hemisphere
/// (golden-angle spiral).
pub fn hemisphere_directions(n: usize) -> Vec<[f64; 3]> {
    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..n)
        .map(|i| {
            let z = (i as f64 + 0.5) / n as f64;
            let r = (1.0 - z * z).sqrt();
            let a = golden * i as f64;
            [r * a.cos(), r * a.sin(), z]
        })
        .collect()
}

/// Gradient table with one baseline acquisition (b = 0, zero vector)
/// followed by one b = 1000 acquisition per direction.
pub fn table_with_baseline(directions: &[[f64; 3]]) -> GradientTable {
    let mut bvals = vec![0.0];
    let mut bvecs = vec![[0.0, 0.0, 0.0]];
    for &d in directions {
        bvals.push(1000.0);
        bvecs.push(d);
    }
    GradientTable::new(bvals, bvecs, 25.0).unwrap()
}

/// Single-voxel 4D volume: baseline signal first, then one sample per
/// direction from `signal`.
pub fn single_voxel_dwi(baseline: f64, signal: &[f64]) -> Array4<f64> {
    let mut values = vec![baseline];
    values.extend_from_slice(signal);
    Array4::from_shape_vec((1, 1, 1, values.len()), values).unwrap()
}

/// All-true single-voxel mask.
pub fn single_voxel_mask(inside: bool) -> Array3<bool> {
    Array3::from_elem((1, 1, 1), inside)
}

/// Signal sampled per direction from an angular profile of the polar
/// angle, `f(theta)` with `theta` measured from +z.
pub fn sample_profile(directions: &[[f64; 3]], f: impl Fn(f64) -> f64) -> Vec<f64> {
    directions
        .iter()
        .map(|d| {
            let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            f((d[2] / norm).clamp(-1.0, 1.0).acos())
        })
        .collect()
}
