//! Binary model persistence.
//!
//! A persisted model is a version-tagged, fixed-width, little-endian
//! artifact, loadable with no knowledge of the training run:
//!
//! ```text
//! u32  format version (currently 1)
//! u32  dimension D
//! u32  cluster count K
//! K ×  [ u32 centroid id | D × f64 coordinates ]
//! ```
//!
//! Loading verifies the version tag, that the payload length matches the
//! declared K and D exactly, that centroid ids appear in position order,
//! and that every stored coordinate is finite; any violation is a
//! `CorruptModel` error. A round-trip reproduces the centroids
//! bit-for-bit.
//!
//! Training diagnostics are not part of the format, so reloaded models
//! report no diagnostics.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Centroid, Model};

/// Version tag written at the head of every artifact.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 12;

/// Encode a model into its binary artifact form.
pub fn to_bytes(model: &Model) -> Vec<u8> {
    let d = model.dimension();
    let k = model.k();
    let mut bytes = Vec::with_capacity(HEADER_LEN + k * (4 + 8 * d));

    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(d as u32).to_le_bytes());
    bytes.extend_from_slice(&(k as u32).to_le_bytes());

    for centroid in model.centroids() {
        bytes.extend_from_slice(&(centroid.id as u32).to_le_bytes());
        for &coord in &centroid.coords {
            bytes.extend_from_slice(&coord.to_le_bytes());
        }
    }

    bytes
}

/// Decode a model from its binary artifact form.
pub fn from_bytes(bytes: &[u8]) -> Result<Model> {
    let mut cursor = Cursor { bytes, offset: 0 };

    let version = cursor.read_u32("version tag")?;
    if version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unrecognized format version {version} (expected {FORMAT_VERSION})"
        )));
    }

    let d = cursor.read_u32("dimension")? as usize;
    let k = cursor.read_u32("cluster count")? as usize;
    if k == 0 || d == 0 {
        return Err(corrupt(format!("declared k={k}, d={d}; both must be nonzero")));
    }

    let expected_len = HEADER_LEN + k * (4 + 8 * d);
    if bytes.len() != expected_len {
        return Err(corrupt(format!(
            "payload is {} bytes, but k={k}, d={d} requires {expected_len}",
            bytes.len()
        )));
    }

    let mut centroids = Vec::with_capacity(k);
    for position in 0..k {
        let id = cursor.read_u32("centroid id")? as usize;
        if id != position {
            return Err(corrupt(format!(
                "centroid id {id} stored at position {position}"
            )));
        }

        let mut coords = Vec::with_capacity(d);
        for _ in 0..d {
            let coord = cursor.read_f64("centroid coordinate")?;
            if !coord.is_finite() {
                return Err(corrupt(format!(
                    "non-finite coordinate in centroid {id}"
                )));
            }
            coords.push(coord);
        }

        centroids.push(Centroid { id, coords });
    }

    Ok(Model::new(centroids, None))
}

/// Write a model artifact to a file.
pub fn save(model: &Model, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, to_bytes(model))?;
    Ok(())
}

/// Read a model artifact from a file.
pub fn load(path: impl AsRef<Path>) -> Result<Model> {
    let bytes = fs::read(path)?;
    from_bytes(&bytes)
}

fn corrupt(reason: String) -> Error {
    Error::CorruptModel { reason }
}

/// Byte cursor over an artifact; every read checks remaining length.
struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl Cursor<'_> {
    fn take(&mut self, len: usize, what: &str) -> Result<&[u8]> {
        let end = self.offset + len;
        if end > self.bytes.len() {
            return Err(corrupt(format!("truncated while reading {what}")));
        }
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let slice = self.take(4, what)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(slice);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f64(&mut self, what: &str) -> Result<f64> {
        let slice = self.take(8, what)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(slice);
        Ok(f64::from_le_bytes(buf))
    }
}
