//! NIfTI volume I/O
//!
//! Reads 3D mask and 4D diffusion volumes from `.nii` / `.nii.gz` files
//! (gzip is auto-detected from the magic bytes) and writes the float32
//! power map. The affine prefers the header's sform and falls back to
//! plain voxel scaling.

use std::io::{Cursor, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::{Array, Array3, Array4, Axis, Ix3, Ix4};
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::error::PowerMapError;
use crate::pipeline::PowerMapVolume;

/// A 3D volume with its spatial metadata.
pub struct Volume3 {
    pub data: Array3<f64>,
    pub affine: [f64; 16],
    pub voxel_size: (f64, f64, f64),
}

/// A 4D volume (three spatial axes plus the acquisition axis) with its
/// spatial metadata.
pub struct Volume4 {
    pub data: Array4<f64>,
    pub affine: [f64; 16],
    pub voxel_size: (f64, f64, f64),
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Header fields useful when a file fails to parse.
fn header_summary(bytes: &[u8]) -> String {
    if bytes.len() < 348 {
        return format!("file too small ({} bytes, need at least 348)", bytes.len());
    }
    let sizeof_hdr = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let magic = String::from_utf8_lossy(&bytes[344..348]).to_string();
    let datatype = i16::from_le_bytes([bytes[70], bytes[71]]);
    format!("sizeof_hdr={sizeof_hdr}, magic={magic:?}, datatype={datatype}")
}

fn read_object(path: &Path) -> Result<InMemNiftiObject, PowerMapError> {
    let bytes = std::fs::read(path).map_err(|e| PowerMapError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let parsed = if is_gzip(&bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(&bytes)))
    } else {
        InMemNiftiObject::from_reader(Cursor::new(&bytes))
    };

    parsed.map_err(|e| {
        let summary = if is_gzip(&bytes) {
            let mut decompressed = Vec::new();
            match std::io::Read::read_to_end(
                &mut GzDecoder::new(Cursor::new(&bytes)),
                &mut decompressed,
            ) {
                Ok(_) => header_summary(&decompressed),
                Err(_) => "could not decompress".to_string(),
            }
        } else {
            header_summary(&bytes)
        };
        PowerMapError::InvalidVolume {
            path: path.to_path_buf(),
            reason: format!("{e} ({summary})"),
        }
    })
}

/// 4x4 row-major affine from the header, sform first, voxel scaling as the
/// fallback.
fn affine_from_header(header: &NiftiHeader) -> [f64; 16] {
    if header.sform_code > 0 {
        let x = &header.srow_x;
        let y = &header.srow_y;
        let z = &header.srow_z;
        [
            x[0] as f64, x[1] as f64, x[2] as f64, x[3] as f64,
            y[0] as f64, y[1] as f64, y[2] as f64, y[3] as f64,
            z[0] as f64, z[1] as f64, z[2] as f64, z[3] as f64,
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        let vsx = header.pixdim[1] as f64;
        let vsy = header.pixdim[2] as f64;
        let vsz = header.pixdim[3] as f64;
        [
            vsx, 0.0, 0.0, 0.0,
            0.0, vsy, 0.0, 0.0,
            0.0, 0.0, vsz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

fn voxel_size_from_header(header: &NiftiHeader) -> (f64, f64, f64) {
    (
        header.pixdim[1] as f64,
        header.pixdim[2] as f64,
        header.pixdim[3] as f64,
    )
}

/// Read a 3D volume. A 4D file with a single trailing volume is accepted
/// and squeezed.
pub fn read_volume_3d(path: &Path) -> Result<Volume3, PowerMapError> {
    let obj = read_object(path)?;
    let affine = affine_from_header(obj.header());
    let voxel_size = voxel_size_from_header(obj.header());

    let array: Array<f64, _> =
        obj.into_volume()
            .into_ndarray()
            .map_err(|e| PowerMapError::InvalidVolume {
                path: path.to_path_buf(),
                reason: format!("could not convert volume data: {e}"),
            })?;

    let mut array = array;
    while array.ndim() > 3 && array.shape()[array.ndim() - 1] == 1 {
        let last = Axis(array.ndim() - 1);
        array = array.index_axis_move(last, 0);
    }

    let data = array
        .into_dimensionality::<Ix3>()
        .map_err(|_| PowerMapError::InvalidVolume {
            path: path.to_path_buf(),
            reason: "expected a 3D volume".to_string(),
        })?;

    Ok(Volume3 {
        data,
        affine,
        voxel_size,
    })
}

/// Read a 4D volume with the acquisition axis last.
pub fn read_volume_4d(path: &Path) -> Result<Volume4, PowerMapError> {
    let obj = read_object(path)?;
    let affine = affine_from_header(obj.header());
    let voxel_size = voxel_size_from_header(obj.header());

    let array: Array<f64, _> =
        obj.into_volume()
            .into_ndarray()
            .map_err(|e| PowerMapError::InvalidVolume {
                path: path.to_path_buf(),
                reason: format!("could not convert volume data: {e}"),
            })?;

    let data = array
        .into_dimensionality::<Ix4>()
        .map_err(|_| PowerMapError::InvalidVolume {
            path: path.to_path_buf(),
            reason: "expected a 4D volume".to_string(),
        })?;

    Ok(Volume4 {
        data,
        affine,
        voxel_size,
    })
}

/// Serialize a power map as a single-channel float32 NIfTI-1 file, data in
/// Fortran order, affine in the sform rows.
fn encode_volume(volume: &PowerMapVolume) -> Vec<u8> {
    let (nx, ny, nz) = volume.data.dim();
    let (vsx, vsy, vsz) = volume.voxel_size;

    let mut header = [0u8; 348];

    // sizeof_hdr = 348
    header[0..4].copy_from_slice(&348i32.to_le_bytes());

    let dim: [i16; 8] = [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1];
    for (i, &d) in dim.iter().enumerate() {
        let offset = 40 + i * 2;
        header[offset..offset + 2].copy_from_slice(&d.to_le_bytes());
    }

    // datatype = 16 (FLOAT32), bitpix = 32
    header[70..72].copy_from_slice(&16i16.to_le_bytes());
    header[72..74].copy_from_slice(&32i16.to_le_bytes());

    let pixdim: [f32; 8] = [1.0, vsx as f32, vsy as f32, vsz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, &p) in pixdim.iter().enumerate() {
        let offset = 76 + i * 4;
        header[offset..offset + 4].copy_from_slice(&p.to_le_bytes());
    }

    // vox_offset = 352 (header plus the 4-byte extension flag)
    header[108..112].copy_from_slice(&352.0f32.to_le_bytes());

    // scl_slope = 1.0, scl_inter = 0.0
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());
    header[116..120].copy_from_slice(&0.0f32.to_le_bytes());

    // sform_code = 1 (scanner anat)
    header[254..256].copy_from_slice(&1i16.to_le_bytes());
    for row in 0..3 {
        for col in 0..4 {
            let offset = 280 + (row * 4 + col) * 4;
            let v = volume.affine[row * 4 + col] as f32;
            header[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
        }
    }

    // magic = "n+1\0" for a single-file NIfTI-1
    header[344..348].copy_from_slice(b"n+1\0");

    let mut buffer = Vec::with_capacity(352 + nx * ny * nz * 4);
    buffer.extend_from_slice(&header);
    buffer.extend_from_slice(&[0u8; 4]);

    // Fortran order: x varies fastest.
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                buffer.extend_from_slice(&(volume.data[[i, j, k]] as f32).to_le_bytes());
            }
        }
    }

    buffer
}

/// Write a power map to disk, gzip-compressed when the path ends in
/// `.nii.gz`.
pub fn write_power_map(path: &Path, volume: &PowerMapVolume) -> Result<(), PowerMapError> {
    let raw = encode_volume(volume);

    let io_err = |e: std::io::Error| PowerMapError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let bytes = if path.to_string_lossy().ends_with(".nii.gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).map_err(io_err)?;
        encoder.finish().map_err(io_err)?
    } else {
        raw
    };

    std::fs::write(path, &bytes).map_err(io_err)
}
