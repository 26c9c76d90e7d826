//! Signals as a JSON array of numbers

use std::path::Path;

use super::{LoadError, Result};
use crate::types::Vector;

pub fn decode_signal(text: &str) -> Result<Vector> {
    let values: Vec<f64> = serde_json::from_str(text)?;
    if values.is_empty() { return Err(LoadError::Empty) }
    Ok(Vector::from(values))
}

pub fn read_signal(path: &Path) -> Result<Vector> {
    decode_signal(&std::fs::read_to_string(path)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn numbers() -> Result<()> {
        assert_eq!(decode_signal("[1, 2.5, -3e2]")?, array![1.0, 2.5, -300.0]);
        Ok(())
    }

    #[test]
    fn rejects_non_numbers_and_empty() {
        assert!(matches!(decode_signal(r#"[1, "two"]"#), Err(LoadError::Json(_))));
        assert!(matches!(decode_signal("{}"          ), Err(LoadError::Json(_))));
        assert!(matches!(decode_signal("[]"          ), Err(LoadError::Empty)));
    }
}
