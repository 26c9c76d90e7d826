//! Comma-separated numbers, without a header row

use std::io::Read;
use std::path::Path;

use ::csv::{ReaderBuilder, StringRecord, Trim};

use super::{LoadError, Result};
use crate::types::{Intensity, Matrix, Vector};

fn reader<R: Read>(source: R) -> ::csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source)
}

fn parse_record(row: usize, record: &StringRecord) -> Result<Vec<Intensity>> {
    record.iter()
        .enumerate()
        .map(|(field, text)| text.parse().map_err(|_| LoadError::NotANumber { row, field, text: text.into() }))
        .collect()
}

/// Every row must have the same number of fields.
pub fn read_matrix_from<R: Read>(source: R) -> Result<Matrix> {
    let mut data = vec![];
    let mut ncols = None;
    let mut nrows = 0;
    for (row, record) in reader(source).records().enumerate() {
        let values = parse_record(row, &record?)?;
        match ncols {
            None => ncols = Some(values.len()),
            Some(expected) if expected != values.len() =>
                return Err(LoadError::Ragged { row, expected, found: values.len() }),
            _ => {}
        }
        data.extend(values);
        nrows += 1;
    }
    let ncols = ncols.filter(|&n| n > 0).ok_or(LoadError::Empty)?;
    Matrix::from_shape_vec((nrows, ncols), data).map_err(|_| LoadError::Empty)
}

/// All values in the file, row after row, regardless of row lengths.
pub fn read_vector_from<R: Read>(source: R) -> Result<Vector> {
    let mut data = vec![];
    for (row, record) in reader(source).records().enumerate() {
        data.extend(parse_record(row, &record?)?);
    }
    if data.is_empty() { return Err(LoadError::Empty) }
    Ok(Vector::from(data))
}

pub fn read_matrix(path: &Path) -> Result<Matrix> {
    read_matrix_from(std::fs::File::open(path)?)
}

pub fn read_vector(path: &Path) -> Result<Vector> {
    read_vector_from(std::fs::File::open(path)?)
}
