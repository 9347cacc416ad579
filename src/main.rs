//! Command-line entry point for the anisotropic power map

use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info};

use powmap_core::config::PowerMapConfig;
use powmap_core::error::PowerMapError;
use powmap_core::gradient_io::{read_bvals, read_bvecs};
use powmap_core::gradients::GradientTable;
use powmap_core::nifti_io::{read_volume_3d, read_volume_4d, write_power_map};
use powmap_core::pipeline::{assemble_volume, compute_power_map};
use powmap_core::shm::validate_sh_order;

#[derive(Parser, Debug)]
#[command(about = "Compute an anisotropic power map from diffusion-weighted MRI")]
struct Args {
    /// Path to the 4D diffusion-weighted volume (.nii or .nii.gz)
    #[arg(long)]
    dwi: PathBuf,

    /// Path to the brain mask, in dwi space
    #[arg(long)]
    mask: PathBuf,

    /// Path to the b-vector file (unit direction per acquisition)
    #[arg(long)]
    bvec: PathBuf,

    /// Path to the b-value file
    #[arg(long)]
    bval: PathBuf,

    /// Output prefix; the map is written to <output>_powMap_sh<order>.nii.gz
    #[arg(long)]
    output: String,

    /// Spherical harmonic order for signal modeling (even, 2 to 12)
    #[arg(long, default_value_t = powmap_core::config::DEFAULT_SH_ORDER)]
    sh_order: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), PowerMapError> {
    for path in [&args.dwi, &args.mask, &args.bvec, &args.bval] {
        if !path.is_file() {
            return Err(PowerMapError::MissingInput(path.clone()));
        }
    }
    validate_sh_order(args.sh_order)?;

    let config = PowerMapConfig::default();

    let bvals = read_bvals(&args.bval)?;
    let bvecs = read_bvecs(&args.bvec)?;
    let gtab = GradientTable::new(bvals, bvecs, config.b0_threshold)?;
    debug!("bvals: {:?}", gtab.bvals());
    debug!("bvecs: {:?}", gtab.bvecs());

    let dwi = read_volume_4d(&args.dwi)?;
    let mask_vol = read_volume_3d(&args.mask)?;
    let (nx, ny, nz, nvol) = dwi.data.dim();
    info!("dwi volume: {nx} x {ny} x {nz} x {nvol}");
    info!(
        "{} baseline and {} diffusion-weighted acquisitions, sh order {}",
        gtab.n_b0(),
        gtab.n_dwi(),
        args.sh_order
    );

    let mask = mask_vol.data.mapv(|v| v != 0.0);
    let map = compute_power_map(&dwi.data, &mask, &gtab, args.sh_order, &config)?;

    let volume = assemble_volume(map, mask_vol.affine, mask_vol.voxel_size);
    let out_name = format!("{}_powMap_sh{}.nii.gz", args.output, args.sh_order);
    info!("writing power map to {out_name}");
    write_power_map(Path::new(&out_name), &volume)
}
