//! Single-plane TIFF writing in native or big-endian byte order.

use std::{fs::File, io, path::Path};

use byteorder::{BigEndian, WriteBytesExt};
use tiff::encoder::{TiffEncoder, TiffValue, colortype};
use tiff_encoder::{LONG, RATIONAL, SHORT, TiffFile, ifd::{Ifd, tags}, write::ByteBlock};

use crate::{
    array::{Plane, PlaneData},
    common::ArgEndianess,
    error::SaveError,
};

const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_FLOAT: u16 = 3;

/// Grayscale sample types we can put into a TIFF.
pub trait TiffSample: Copy {
    type Color: colortype::ColorType<Inner = Self>;
    const BITS_PER_SAMPLE: u16;
    const SAMPLE_FORMAT: u16;

    fn write_be(self, out: &mut Vec<u8>) -> io::Result<()>;
}

macro_rules! tiff_sample {
    ($t:ty, $color:ty, $bits:expr, $format:expr, |$v:ident, $out:ident| $write:expr) => {
        impl TiffSample for $t {
            type Color = $color;
            const BITS_PER_SAMPLE: u16 = $bits;
            const SAMPLE_FORMAT: u16 = $format;

            fn write_be(self, $out: &mut Vec<u8>) -> io::Result<()> {
                let $v = self;
                $write
            }
        }
    };
}

tiff_sample!(u8, colortype::Gray8, 8, SAMPLE_FORMAT_UINT, |v, out| out.write_u8(v));
tiff_sample!(u16, colortype::Gray16, 16, SAMPLE_FORMAT_UINT, |v, out| {
    out.write_u16::<BigEndian>(v)
});
tiff_sample!(i16, colortype::GrayI16, 16, SAMPLE_FORMAT_INT, |v, out| {
    out.write_i16::<BigEndian>(v)
});
tiff_sample!(i32, colortype::GrayI32, 32, SAMPLE_FORMAT_INT, |v, out| {
    out.write_i32::<BigEndian>(v)
});
tiff_sample!(i64, colortype::GrayI64, 64, SAMPLE_FORMAT_INT, |v, out| {
    out.write_i64::<BigEndian>(v)
});
tiff_sample!(f32, colortype::Gray32Float, 32, SAMPLE_FORMAT_FLOAT, |v, out| {
    out.write_f32::<BigEndian>(v)
});
tiff_sample!(f64, colortype::Gray64Float, 64, SAMPLE_FORMAT_FLOAT, |v, out| {
    out.write_f64::<BigEndian>(v)
});

fn create(filename: &Path, overwrite: bool) -> io::Result<File> {
    if overwrite {
        File::create(filename)
    } else {
        File::create_new(filename)
    }
}

pub fn write_tiff_native_endian<T: TiffSample>(
    filename: &Path,
    plane: &Plane<T>,
    overwrite: bool,
) -> Result<(), SaveError>
where
    [T]: TiffValue,
{
    let mut out_file = create(filename, overwrite)?;
    let mut tiff = TiffEncoder::new(&mut out_file)?;
    tiff.write_image::<T::Color>(plane.cols as u32, plane.rows as u32, &plane.values)?;
    Ok(())
}

pub fn write_tiff_big_endian<T: TiffSample>(
    filename: &Path,
    plane: &Plane<T>,
    overwrite: bool,
) -> Result<(), SaveError> {
    let bytes_per_sample = usize::from(T::BITS_PER_SAMPLE / 8);
    let mut image_bytes: Vec<u8> = Vec::with_capacity(plane.values.len() * bytes_per_sample);
    for value in plane.values.iter() {
        value.write_be(&mut image_bytes)?;
    }

    // tiff-encoder always truncates, so check for an existing file first
    if !overwrite && filename.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", filename.display()),
        )
        .into());
    }

    TiffFile::new(
        Ifd::new()
            .with_entry(tags::PhotometricInterpretation, SHORT![1]) // Black is zero
            .with_entry(tags::Compression, SHORT![1]) // No compression

            .with_entry(tags::BitsPerSample, SHORT![T::BITS_PER_SAMPLE])
            .with_entry(tags::SamplesPerPixel, SHORT![1])
            .with_entry(tags::SampleFormat, SHORT![T::SAMPLE_FORMAT])

            .with_entry(tags::ImageLength, LONG![plane.rows as u32])
            .with_entry(tags::ImageWidth, LONG![plane.cols as u32])

            .with_entry(tags::ResolutionUnit, SHORT![1]) // No resolution unit
            .with_entry(tags::XResolution, RATIONAL![(1, 1)])
            .with_entry(tags::YResolution, RATIONAL![(1, 1)])

            .with_entry(tags::RowsPerStrip, LONG![plane.rows as u32]) // One strip
            .with_entry(tags::StripByteCounts, LONG![image_bytes.len() as u32])
            .with_entry(tags::StripOffsets, ByteBlock::single(image_bytes))
            .single()
    ).with_endianness(tiff_encoder::write::Endianness::MM).write_to(filename)?;

    Ok(())
}

fn write_typed<T: TiffSample>(
    filename: &Path,
    plane: &Plane<T>,
    endianess: ArgEndianess,
    overwrite: bool,
) -> Result<(), SaveError>
where
    [T]: TiffValue,
{
    match endianess {
        ArgEndianess::Big => write_tiff_big_endian(filename, plane, overwrite),
        ArgEndianess::Native => write_tiff_native_endian(filename, plane, overwrite),
    }
}

/// Write one grayscale plane. With `overwrite == false` an existing file is
/// an error.
pub fn write_plane(
    filename: &Path,
    plane: &PlaneData,
    endianess: ArgEndianess,
    overwrite: bool,
) -> Result<(), SaveError> {
    match plane {
        PlaneData::U8(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::U16(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::I16(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::I32(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::I64(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::F32(p) => write_typed(filename, p, endianess, overwrite),
        PlaneData::F64(p) => write_typed(filename, p, endianess, overwrite),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use tiff::decoder::{Decoder, DecodingResult};

    fn plane() -> Plane<u16> {
        Plane {
            rows: 2,
            cols: 3,
            values: vec![1, 2, 3, 4, 5, 600],
        }
    }

    #[test]
    fn native_endian_plane_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.tif");
        write_plane(&path, &PlaneData::U16(plane()), ArgEndianess::Native, false).unwrap();

        let mut decoder = Decoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));
        match decoder.read_image().unwrap() {
            DecodingResult::U16(values) => assert_eq!(values, plane().values),
            _ => panic!("expected 16 bit samples"),
        }
    }

    #[test]
    fn big_endian_plane_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.tif");
        write_plane(&path, &PlaneData::U16(plane()), ArgEndianess::Big, false).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"MM");
        let mut decoder = Decoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (3, 2));
    }

    #[test]
    fn refuses_to_overwrite_unless_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.tif");
        let data = PlaneData::U16(plane());
        write_plane(&path, &data, ArgEndianess::Native, false).unwrap();
        assert!(write_plane(&path, &data, ArgEndianess::Native, false).is_err());
        assert!(write_plane(&path, &data, ArgEndianess::Big, false).is_err());
        write_plane(&path, &data, ArgEndianess::Native, true).unwrap();
    }
}
