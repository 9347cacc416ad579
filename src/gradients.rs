//! Gradient table: b-value / b-vector bookkeeping
//!
//! Partitions the acquisition list into baseline (near-zero diffusion
//! weighting) and diffusion-weighted sets. Everything downstream of the
//! normalizer works on the diffusion-weighted subset only.

use crate::error::PowerMapError;

/// Parallel b-value and b-vector sequences plus the derived baseline mask.
///
/// The baseline mask is `bval < b0_threshold`. The table is immutable once
/// built; accessors hand out the partition the pipeline stages need.
#[derive(Debug, Clone)]
pub struct GradientTable {
    bvals: Vec<f64>,
    bvecs: Vec<[f64; 3]>,
    b0_mask: Vec<bool>,
}

impl GradientTable {
    /// Build a table from parallel b-value / b-vector sequences.
    ///
    /// Fails when the sequences have unequal lengths, or when either the
    /// baseline or the diffusion-weighted set comes out empty: without a
    /// baseline there is nothing to normalize against, and without
    /// diffusion-weighted directions there is nothing to fit.
    pub fn new(
        bvals: Vec<f64>,
        bvecs: Vec<[f64; 3]>,
        b0_threshold: f64,
    ) -> Result<Self, PowerMapError> {
        if bvals.len() != bvecs.len() {
            return Err(PowerMapError::InvalidGradientTable(format!(
                "{} b-values but {} b-vectors",
                bvals.len(),
                bvecs.len()
            )));
        }

        let b0_mask: Vec<bool> = bvals.iter().map(|&b| b < b0_threshold).collect();

        let n_b0 = b0_mask.iter().filter(|&&m| m).count();
        if n_b0 == 0 {
            return Err(PowerMapError::InvalidGradientTable(format!(
                "no baseline acquisitions below b = {b0_threshold}"
            )));
        }
        if n_b0 == b0_mask.len() {
            return Err(PowerMapError::InvalidGradientTable(format!(
                "no diffusion-weighted acquisitions at or above b = {b0_threshold}"
            )));
        }

        Ok(GradientTable {
            bvals,
            bvecs,
            b0_mask,
        })
    }

    /// Number of acquisitions in the table.
    pub fn len(&self) -> usize {
        self.bvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bvals.is_empty()
    }

    pub fn bvals(&self) -> &[f64] {
        &self.bvals
    }

    pub fn bvecs(&self) -> &[[f64; 3]] {
        &self.bvecs
    }

    /// Per-acquisition baseline flag, true where `bval < b0_threshold`.
    pub fn b0_mask(&self) -> &[bool] {
        &self.b0_mask
    }

    /// Indices of the baseline acquisitions.
    pub fn b0_indices(&self) -> Vec<usize> {
        self.indices_where(true)
    }

    /// Indices of the diffusion-weighted acquisitions.
    pub fn dwi_indices(&self) -> Vec<usize> {
        self.indices_where(false)
    }

    /// Direction vectors of the diffusion-weighted acquisitions.
    pub fn dwi_bvecs(&self) -> Vec<[f64; 3]> {
        self.dwi_indices().iter().map(|&i| self.bvecs[i]).collect()
    }

    pub fn n_b0(&self) -> usize {
        self.b0_mask.iter().filter(|&&m| m).count()
    }

    pub fn n_dwi(&self) -> usize {
        self.len() - self.n_b0()
    }

    fn indices_where(&self, flag: bool) -> Vec<usize> {
        self.b0_mask
            .iter()
            .enumerate()
            .filter(|&(_, &m)| m == flag)
            .map(|(i, _)| i)
            .collect()
    }
}
