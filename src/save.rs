//! Writing arrays and their slice metadata to disk.

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use log::{info, warn};
use ndarray_npy::{NpzWriter, write_npy};

use crate::{
    array::{ArrayData, with_array},
    common::{ArgEndianess, SaveFormat},
    error::SaveError,
    host::SliceMetadata,
    write::write_plane,
};

/// Name of the single entry in npz archives, as numpy's `savez` would call it.
pub const NPZ_ENTRY: &str = "arr_0";

/// Write `data` to `path` in `format`, replacing any existing file.
///
/// TIFF output holds a single grayscale plane: arrays with more than two
/// axes are reduced to their first plane.
pub fn save_array(
    data: &ArrayData,
    path: &Path,
    format: SaveFormat,
    endianess: ArgEndianess,
) -> Result<(), SaveError> {
    info!("writing {:?} {} array to {path:?} as {format}", data.shape(), data.dtype());
    match format {
        SaveFormat::Npy => with_array!(data, arr => write_npy(path, arr)?),
        SaveFormat::Npz => {
            let mut npz = NpzWriter::new(File::create(path)?);
            with_array!(data, arr => npz.add_array(NPZ_ENTRY, arr)?);
            npz.finish()?;
        }
        SaveFormat::Tiff => {
            if data.ndim() > 2 {
                warn!(
                    "tiff holds one plane, writing plane 1 of {} (leading shape {:?})",
                    data.plane_count(),
                    data.leading_shape()
                );
            }
            if data.is_complex() {
                info!("complex data, writing magnitude");
            }
            write_plane(path, &data.plane(&[]), endianess, true)?;
        }
    }
    Ok(())
}

/// Like [`save_array`], with the format taken from a tag such as `"tif"`.
pub fn save_array_as(
    data: &ArrayData,
    path: &Path,
    format_tag: &str,
    endianess: ArgEndianess,
) -> Result<(), SaveError> {
    let format = SaveFormat::from_tag(format_tag)
        .ok_or_else(|| SaveError::UnsupportedFormat(format_tag.to_owned()))?;
    save_array(data, path, format, endianess)
}

pub fn sidecar_path(path: &Path) -> PathBuf {
    path.with_extension("json")
}

pub fn write_metadata(path: &Path, metadata: &SliceMetadata) -> Result<(), SaveError> {
    let out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(out, metadata)?;
    Ok(())
}

/// Write the metadata sidecar next to `path`. Failing to do so is only
/// logged; the array itself has already been written.
pub fn write_metadata_sidecar(path: &Path, metadata: &SliceMetadata) -> Option<PathBuf> {
    let sidecar = sidecar_path(path);
    match write_metadata(&sidecar, metadata) {
        Ok(()) => {
            info!("metadata written to {sidecar:?}");
            Some(sidecar)
        }
        Err(e) => {
            warn!("could not write metadata to {sidecar:?}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, ArrayD, IxDyn};
    use ndarray_npy::{NpzReader, read_npy};
    use num_complex::Complex32;

    fn ramp(shape: &[usize]) -> ArrayD<f32> {
        let len = shape.iter().product::<usize>();
        Array::from_shape_vec(IxDyn(shape), (0..len).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn npy_keeps_shape_and_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.npy");
        let arr = ramp(&[2, 3, 4]);
        let data = ArrayData::F32(arr.clone());
        save_array(&data, &path, SaveFormat::Npy, ArgEndianess::Native).unwrap();
        let back: ArrayD<f32> = read_npy(&path).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn npz_has_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.npz");
        let arr = ramp(&[3, 2]);
        save_array_as(&ArrayData::F32(arr.clone()), &path, "NPZ", ArgEndianess::Native).unwrap();
        let mut npz = NpzReader::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(npz.len(), 1);
        let back: ArrayD<f32> = npz.by_index(0).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn tiff_from_3d_and_complex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tif");
        let data = ArrayData::F32(ramp(&[4, 5, 6]));
        save_array_as(&data, &path, "tif", ArgEndianess::Native).unwrap();
        assert!(path.metadata().unwrap().len() > 0);

        let complex = Array::from_elem(IxDyn(&[2, 2]), Complex32::new(0.0, 1.0));
        save_array(&ArrayData::C32(complex), &path, SaveFormat::Tiff, ArgEndianess::Big).unwrap();
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = ArrayData::F32(ramp(&[2]));
        let path = dir.path().join("a.png");
        let err = save_array_as(&data, &path, "png", ArgEndianess::Native).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedFormat(tag) if tag == "png"));
    }

    #[test]
    fn sidecar_next_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = SliceMetadata {
            source_relation: "sliced".into(),
            original_name: "img".into(),
            original_shape: vec![3, 100, 100],
            sliced_shape: vec![3, 50, 60],
            slice_bounds: vec![(0, 3), (10, 60), (20, 80)],
        };
        let output = dir.path().join("img_sliced.npy");
        let sidecar = write_metadata_sidecar(&output, &metadata).unwrap();
        assert_eq!(sidecar, dir.path().join("img_sliced.json"));
        let json: serde_json::Value =
            serde_json::from_reader(File::open(&sidecar).unwrap()).unwrap();
        assert_eq!(json["slice_bounds"], serde_json::json!([[0, 3], [10, 60], [20, 80]]));
        assert_eq!(json["source_relation"], "sliced");

        let missing_dir = dir.path().join("nope").join("x.npy");
        assert_eq!(write_metadata_sidecar(&missing_dir, &metadata), None);
    }
}
