use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use crate::utils::io;

/// Configuration for a self-attention encoder
///
/// ```json
/// { "embed_dim": 8, "num_heads": 2, "seed": 42 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub embed_dim: usize, // d_model, split evenly across heads
    pub num_heads: usize,

    #[serde(default = "default_layer_norm_eps")]
    pub layer_norm_eps: f32, // added to the std, not the variance

    /// Seed for weight sampling; `None` means fresh entropy on every construction.
    #[serde(default)]
    pub seed: Option<u64>,
}

pub(crate) fn default_layer_norm_eps() -> f32 {
    1e-6
}

impl EncoderConfig {
    pub fn new(embed_dim: usize, num_heads: usize) -> Self {
        Self {
            embed_dim,
            num_heads,
            layer_norm_eps: default_layer_norm_eps(),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn head_dim(&self) -> usize {
        self.embed_dim / self.num_heads
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.embed_dim == 0 {
            return Err(ModelError::ConfigError(
                "embed_dim must be positive".to_string(),
            ));
        }
        if self.num_heads == 0 {
            return Err(ModelError::ConfigError(
                "num_heads must be positive".to_string(),
            ));
        }
        if self.embed_dim % self.num_heads != 0 {
            return Err(ModelError::ConfigError(format!(
                "embed_dim {} must be divisible by num_heads {}",
                self.embed_dim, self.num_heads
            )));
        }
        if self.layer_norm_eps.is_nan() || self.layer_norm_eps < 0.0 {
            return Err(ModelError::ConfigError(format!(
                "layer_norm_eps must be non-negative, got {}",
                self.layer_norm_eps
            )));
        }
        Ok(())
    }

    /// Loads and validates a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let text = io::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(io::IoError::from)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_accepts_divisible() {
        let config = EncoderConfig::new(8, 2);
        assert!(config.validate().is_ok());
        assert_eq!(config.head_dim(), 4);
    }

    #[test]
    fn test_validate_rejects_indivisible() {
        let err = EncoderConfig::new(7, 2).validate().unwrap_err();
        assert!(matches!(err, ModelError::ConfigError(_)));
        assert!(err.to_string().contains("divisible"));
    }

    #[test]
    fn test_validate_rejects_zero() {
        assert!(EncoderConfig::new(0, 1).validate().is_err());
        assert!(EncoderConfig::new(8, 0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan_eps() {
        let mut config = EncoderConfig::new(4, 1);
        config.layer_norm_eps = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"embed_dim": 12, "num_heads": 3}}"#).unwrap();

        let config = EncoderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config, EncoderConfig::new(12, 3));
        assert_eq!(config.layer_norm_eps, 1e-6);
    }

    #[test]
    fn test_from_json_file_with_seed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"embed_dim": 8, "num_heads": 4, "seed": 7}}"#).unwrap();

        let config = EncoderConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_from_json_file_validates() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"embed_dim": 7, "num_heads": 2}}"#).unwrap();

        assert!(matches!(
            EncoderConfig::from_json_file(file.path()),
            Err(ModelError::ConfigError(_))
        ));
    }

    #[test]
    fn test_from_json_file_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            EncoderConfig::from_json_file(file.path()),
            Err(ModelError::Io(_))
        ));
    }
}
