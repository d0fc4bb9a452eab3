use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{ArrayD, IxDyn};
use serde_json::Value;
use thiserror::Error;

/// Error type for I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

/// Reads a file to string with proper error handling
pub fn read_to_string(path: impl AsRef<Path>) -> Result<String, IoError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound(path.to_path_buf())
        } else {
            IoError::StdIo(e)
        }
    })
}

/// Reads a dense array from a JSON file of nested number lists.
pub fn read_array_json(path: impl AsRef<Path>) -> Result<ArrayD<f32>, IoError> {
    let text = read_to_string(path)?;
    parse_array_json(&text)
}

/// Parses nested JSON number lists into a dense array.
///
/// A bare number becomes a rank-0 array. Every list at the same depth must have the
/// same length.
pub fn parse_array_json(text: &str) -> Result<ArrayD<f32>, IoError> {
    let value: Value = serde_json::from_str(text)?;

    let mut shape = Vec::new();
    let mut cursor = &value;
    while let Value::Array(items) = cursor {
        shape.push(items.len());
        match items.first() {
            Some(first) => cursor = first,
            None => break,
        }
    }

    let mut data = Vec::with_capacity(shape.iter().product());
    flatten_into(&value, &shape, &mut data)?;

    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|e| IoError::InvalidFormat(e.to_string()))
}

fn flatten_into(value: &Value, shape: &[usize], out: &mut Vec<f32>) -> Result<(), IoError> {
    match (value, shape.split_first()) {
        (Value::Array(items), Some((&len, rest))) => {
            if items.len() != len {
                return Err(IoError::InvalidFormat(format!(
                    "Ragged array: expected {} elements, found {}",
                    len,
                    items.len()
                )));
            }
            for item in items {
                flatten_into(item, rest, out)?;
            }
            Ok(())
        }
        (Value::Number(n), None) => {
            let v = n
                .as_f64()
                .ok_or_else(|| IoError::InvalidFormat(format!("Unrepresentable number {}", n)))?;
            out.push(v as f32);
            Ok(())
        }
        (Value::Bool(b), None) => {
            out.push(if *b { 1.0 } else { 0.0 });
            Ok(())
        }
        (other, _) => Err(IoError::InvalidFormat(format!(
            "Unexpected value {} with {} dimensions remaining",
            other,
            shape.len()
        ))),
    }
}
