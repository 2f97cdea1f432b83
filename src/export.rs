//! Parallel export of every 2D plane to its own TIFF file.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use indicatif::{MultiProgress, ParallelProgressIterator, ProgressBar};
use log::{debug, info};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::{
    array::ArrayData,
    common::ArgEndianess,
    error::SaveError,
    write::write_plane,
};

pub fn plane_path(dest_dir: &Path, idx: usize) -> PathBuf {
    // 1-indexed, like the frame numbers users see
    dest_dir.join(format!("plane_{:05}.tif", idx + 1))
}

/// Write every 2-D plane of `data` as its own TIFF into `dest_dir`, in
/// parallel. Existing files are not overwritten. Returns the number of
/// planes written.
pub fn export_planes(
    data: &ArrayData,
    dest_dir: &Path,
    endianess: ArgEndianess,
    multi_progress: &MultiProgress,
) -> Result<usize, SaveError> {
    let t0 = Instant::now();

    fs::create_dir_all(dest_dir)?;

    let total = data.plane_count();
    info!(
        "exporting {total} planes of {:?} ({}) to {dest_dir:?}",
        data.shape(),
        data.dtype()
    );
    info!("endianess: {:?}", endianess);

    let progress = multi_progress.add(ProgressBar::new(total as u64));

    let res: Result<Vec<()>, SaveError> = (0..total)
        .into_par_iter()
        .progress_with(progress.clone())
        .map(|idx| -> Result<(), SaveError> {
            let out_path = plane_path(dest_dir, idx);
            write_plane(&out_path, &data.plane_at(idx), endianess, false)?;
            debug!("created {out_path:?}");
            Ok(())
        })
        .collect();
    res?;

    progress.finish();
    multi_progress.remove(&progress);

    info!("export done in {:?}", t0.elapsed());

    Ok(total)
}
