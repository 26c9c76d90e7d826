//! Read / write signals as raw little-endian 32-bit floats

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{LoadError, Result};
use crate::types::Vector;

const WIDTH: usize = std::mem::size_of::<f32>();

/// Decode an in-memory payload, such as the body of a request
pub fn decode_f32_le(bytes: &[u8]) -> Result<Vector> {
    if bytes.len() % WIDTH != 0 { return Err(LoadError::RawLength { len: bytes.len() }) }
    if bytes.is_empty() { return Err(LoadError::Empty) }
    Ok(bytes.chunks_exact(WIDTH)
       .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
       .collect())
}

pub fn encode_f32_le(data: impl Iterator<Item = f32>) -> Vec<u8> {
    data.flat_map(f32::to_le_bytes).collect()
}

pub fn read_signal(path: &Path) -> Result<Vector> {
    decode_f32_le(&std::fs::read(path)?)
}

/// Write `data` to `path`, e.g. a signal captured elsewhere for later reconstruction
pub fn write(data: impl Iterator<Item = f32>, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(&encode_f32_le(data))?;
    out.flush()
}
