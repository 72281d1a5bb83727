// ============================================================
// Layer 4 - IDX Tensor Files
// ============================================================
// The dataset lives on disk as IDX files, the format MNIST has
// always shipped in:
//
//   byte 0..2   0x00 0x00
//   byte 2      element type (0x08 u8, 0x0C i32, 0x0D f32)
//   byte 3      number of dimensions D
//   next 4*D    each dimension as a big-endian u32
//   rest        product(dims) big-endian elements
//
// Files ending in `.gz` are gunzipped on the fly.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::Path,
};

use flate2::read::GzDecoder;

use crate::data::error::DataError;

const TYPE_U8: u8 = 0x08;
const TYPE_I32: u8 = 0x0C;
const TYPE_F32: u8 = 0x0D;

/// Element payload of an IDX file.
#[derive(Debug, Clone, PartialEq)]
pub enum IdxElements {
    U8(Vec<u8>),
    I32(Vec<i32>),
    F32(Vec<f32>),
}

/// A dense n-dimensional array read from (or written to) an IDX file.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxArray {
    pub dims:     Vec<usize>,
    pub elements: IdxElements,
}

impl IdxArray {
    /// Read and decode an IDX file, gunzipping `*.gz`.
    pub fn read(path: &Path) -> Result<Self, DataError> {
        let io_err = |source| DataError::Io { path: path.to_path_buf(), source };

        let bytes = if path.extension().is_some_and(|e| e == "gz") {
            let mut buf = Vec::new();
            GzDecoder::new(File::open(path).map_err(io_err)?)
                .read_to_end(&mut buf)
                .map_err(io_err)?;
            buf
        } else {
            fs::read(path).map_err(io_err)?
        };

        Self::parse(&bytes, path)
    }

    /// Decode IDX bytes. `path` is only used in error messages.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self, DataError> {
        if bytes.len() < 4 || bytes[0] != 0 || bytes[1] != 0 {
            return Err(DataError::BadMagic { path: path.to_path_buf() });
        }

        let code = bytes[2];
        let elem_size = match code {
            TYPE_U8 => 1,
            TYPE_I32 | TYPE_F32 => 4,
            _ => return Err(DataError::UnsupportedType { path: path.to_path_buf(), code }),
        };

        let ndims = bytes[3] as usize;
        let header_len = 4 + 4 * ndims;
        if bytes.len() < header_len {
            return Err(DataError::PayloadLength {
                path:     path.to_path_buf(),
                expected: header_len,
                found:    bytes.len(),
            });
        }

        let dims: Vec<usize> = bytes[4..header_len]
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]) as usize)
            .collect();

        let expected = dims
            .iter()
            .try_fold(elem_size, |acc: usize, &d| acc.checked_mul(d))
            .ok_or_else(|| DataError::HeaderOverflow { path: path.to_path_buf(), dims: dims.clone() })?;

        let payload = &bytes[header_len..];
        if payload.len() != expected {
            return Err(DataError::PayloadLength {
                path:     path.to_path_buf(),
                expected,
                found:    payload.len(),
            });
        }

        let elements = match code {
            TYPE_U8 => IdxElements::U8(payload.to_vec()),
            TYPE_I32 => IdxElements::I32(
                payload
                    .chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            _ => IdxElements::F32(
                payload
                    .chunks_exact(4)
                    .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
        };

        Ok(Self { dims, elements })
    }

    /// Encode to IDX bytes. Fails when there are more than 255
    /// dimensions or a dimension does not fit in a u32.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DataError> {
        let unencodable = || DataError::Unencodable { dims: self.dims.clone() };

        let (code, payload): (u8, Vec<u8>) = match &self.elements {
            IdxElements::U8(v) => (TYPE_U8, v.clone()),
            IdxElements::I32(v) => (TYPE_I32, v.iter().flat_map(|x| x.to_be_bytes()).collect()),
            IdxElements::F32(v) => (TYPE_F32, v.iter().flat_map(|x| x.to_be_bytes()).collect()),
        };

        let ndims = u8::try_from(self.dims.len()).map_err(|_| unencodable())?;
        let mut out = vec![0, 0, code, ndims];
        for &d in &self.dims {
            let d = u32::try_from(d).map_err(|_| unencodable())?;
            out.extend_from_slice(&d.to_be_bytes());
        }
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Write to `path`, gzipping when it ends in `.gz`.
    pub fn write(&self, path: &Path) -> Result<(), DataError> {
        let io_err = |source| DataError::Io { path: path.to_path_buf(), source };
        let bytes = self.to_bytes()?;

        if path.extension().is_some_and(|e| e == "gz") {
            let file = File::create(path).map_err(io_err)?;
            let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            enc.write_all(&bytes).map_err(io_err)?;
            enc.finish().map_err(io_err)?;
            Ok(())
        } else {
            fs::write(path, bytes).map_err(io_err)
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match &self.elements {
            IdxElements::U8(v) => v.len(),
            IdxElements::I32(v) => v.len(),
            IdxElements::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel intensities in [0, 1]: bytes are divided by 255,
    /// floats are taken as stored.
    pub fn to_pixels(&self) -> Vec<f32> {
        match &self.elements {
            IdxElements::U8(v) => v.iter().map(|&p| p as f32 / 255.0).collect(),
            IdxElements::I32(v) => v.iter().map(|&p| p as f32 / 255.0).collect(),
            IdxElements::F32(v) => v.clone(),
        }
    }

    /// Elements as integer class labels. Float labels must be whole
    /// numbers; `path` is only used in error messages.
    pub fn to_labels(&self, path: &Path) -> Result<Vec<i64>, DataError> {
        match &self.elements {
            IdxElements::U8(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            IdxElements::I32(v) => Ok(v.iter().map(|&x| x as i64).collect()),
            IdxElements::F32(v) => v
                .iter()
                .enumerate()
                .map(|(index, &value)| {
                    if value.is_finite() && value.fract() == 0.0 {
                        Ok(value as i64)
                    } else {
                        Err(DataError::NonIntegerLabel { path: path.to_path_buf(), index, value })
                    }
                })
                .collect(),
        }
    }
}
