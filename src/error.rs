//! Error types for the power map pipeline
//!
//! Every precondition failure aborts the run with a descriptive message;
//! none are silently recovered. Per-voxel numerical degeneracy (zero
//! baseline signal in masked-out anatomy) is handled locally by the
//! normalizer and never surfaces here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PowerMapError {
    /// An input file named on the command line does not exist.
    #[error("input file does not exist: {}", .0.display())]
    MissingInput(PathBuf),

    /// The b-value/b-vector table is unusable for fitting.
    #[error("invalid gradient table: {0}")]
    InvalidGradientTable(String),

    /// The diffusion-weighted direction set cannot support the requested fit.
    #[error("degenerate direction set: {0}")]
    DegenerateDirectionSet(String),

    /// The normal matrix of the SH design is singular and cannot be
    /// inverted directly. A positive smoothing weight regularizes it.
    #[error("SH design matrix is ill-conditioned; retry with a positive smoothing weight")]
    IllConditionedBasis,

    /// DWI and mask volumes are not spatially co-registered.
    #[error("dwi spatial dims {dwi:?} do not match mask dims {mask:?}")]
    DimensionMismatch {
        dwi: (usize, usize, usize),
        mask: (usize, usize, usize),
    },

    /// SH order outside the supported range.
    #[error("sh order must be an even integer in [2, 12], got {0}")]
    InvalidShOrder(usize),

    /// A file could not be read or written.
    #[error("{}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },

    /// A volume file was read but is not usable.
    #[error("{}: {reason}", .path.display())]
    InvalidVolume { path: PathBuf, reason: String },

    /// Internal array reshape failed; indicates a bug, not bad input.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
