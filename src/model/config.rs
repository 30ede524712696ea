//! Layer layout of the binary classifier.

use super::error::ModelError;
use serde::{Deserialize, Serialize};

/// Five parallel size lists describing the classifier.
///
/// `channel_sizes` starts with the input channel count and has one more
/// entry than `kernel_sizes`, `strides`, and `paddings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    pub channel_sizes: Vec<usize>,
    pub kernel_sizes: Vec<usize>,
    pub strides: Vec<usize>,
    pub paddings: Vec<usize>,
    pub linear_layer_sizes: Vec<usize>,
}

impl Default for ClassifierConfig {
    /// Three blocks that reduce a 3 x 151 accelerometer sequence to length 1.
    fn default() -> Self {
        Self {
            channel_sizes: vec![3, 16, 32, 64],
            kernel_sizes: vec![11, 9, 14],
            strides: vec![4, 2, 1],
            paddings: vec![0, 0, 0],
            linear_layer_sizes: vec![32, 1],
        }
    }
}

impl ClassifierConfig {
    pub fn new(
        channel_sizes: Vec<usize>,
        kernel_sizes: Vec<usize>,
        strides: Vec<usize>,
        paddings: Vec<usize>,
        linear_layer_sizes: Vec<usize>,
    ) -> Self {
        Self {
            channel_sizes,
            kernel_sizes,
            strides,
            paddings,
            linear_layer_sizes,
        }
    }

    /// Number of convolution blocks.
    pub fn num_conv_blocks(&self) -> usize {
        self.channel_sizes.len().saturating_sub(1)
    }

    /// Channel count after the last convolution block.
    pub fn final_channels(&self) -> Option<usize> {
        self.channel_sizes.last().copied()
    }

    /// Check list lengths and reject zero sizes.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.channel_sizes.is_empty() {
            return Err(ModelError::Configuration(
                "channel_sizes must list at least the input channel count".to_string(),
            ));
        }
        let blocks = self.num_conv_blocks();
        for (name, list) in [
            ("kernel_sizes", &self.kernel_sizes),
            ("strides", &self.strides),
            ("paddings", &self.paddings),
        ] {
            if list.len() != blocks {
                return Err(ModelError::Configuration(format!(
                    "{name} has {} entries; {} channel sizes need {blocks}",
                    list.len(),
                    self.channel_sizes.len()
                )));
            }
        }
        if self.linear_layer_sizes.is_empty() {
            return Err(ModelError::Configuration(
                "linear_layer_sizes must not be empty".to_string(),
            ));
        }
        for (name, list) in [
            ("channel_sizes", &self.channel_sizes),
            ("kernel_sizes", &self.kernel_sizes),
            ("strides", &self.strides),
            ("linear_layer_sizes", &self.linear_layer_sizes),
        ] {
            if let Some(i) = list.iter().position(|&v| v == 0) {
                return Err(ModelError::Configuration(format!("{name}[{i}] is zero")));
            }
        }
        Ok(())
    }

    /// Length of the time axis after the convolution stack, if every block
    /// fits its input.
    ///
    /// The first linear layer expects exactly one position per channel, so
    /// layouts where this is not `Some(1)` fail at the first forward pass.
    pub fn output_len(&self, input_len: usize) -> Option<usize> {
        let mut len = input_len;
        for ((&kernel, &stride), &padding) in self
            .kernel_sizes
            .iter()
            .zip(&self.strides)
            .zip(&self.paddings)
        {
            let padded = len + 2 * padding;
            if stride == 0 || padded < kernel {
                return None;
            }
            len = (padded - kernel) / stride + 1;
        }
        Some(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reduces_sequence_to_one() {
        let config = ClassifierConfig::default();
        config.validate().unwrap();
        assert_eq!(config.num_conv_blocks(), 3);
        assert_eq!(config.output_len(151), Some(1));
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let config = ClassifierConfig::new(
            vec![3, 8, 16],
            vec![5],
            vec![1, 1],
            vec![0, 0],
            vec![32, 1],
        );
        assert!(matches!(
            config.validate(),
            Err(ModelError::Configuration(msg)) if msg.contains("kernel_sizes")
        ));
    }

    #[test]
    fn test_zero_and_empty_sizes_are_rejected() {
        let mut config = ClassifierConfig::new(vec![3, 8], vec![5], vec![1], vec![0], vec![]);
        assert!(config.validate().is_err());
        config.linear_layer_sizes = vec![1];
        config.strides = vec![0];
        assert!(config.validate().is_err());
        config.strides = vec![1];
        assert!(config.validate().is_ok());
        assert!(ClassifierConfig::new(vec![], vec![], vec![], vec![], vec![1])
            .validate()
            .is_err());
    }

    #[test]
    fn test_output_len() {
        let config = ClassifierConfig::new(vec![3, 8, 16], vec![5, 5], vec![1, 1], vec![0, 0], vec![1]);
        assert_eq!(config.output_len(9), Some(1));
        assert_eq!(config.output_len(20), Some(12));
        assert_eq!(config.output_len(7), None);
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "channel_sizes": [3, 8],
            "kernel_sizes": [3],
            "strides": [1],
            "paddings": [1],
            "linear_layer_sizes": [4, 1]
        }"#;
        let config: ClassifierConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.paddings, vec![1]);
        config.validate().unwrap();
    }
}
