//! Stage-by-stage construction and evaluation of the binary classifier.

use super::config::ClassifierConfig;
use super::error::ModelError;
use candle_core::{DType, Device, Module, ModuleT, Tensor};
use candle_nn::{BatchNorm, BatchNormConfig, Conv1d, Conv1dConfig, Linear, VarBuilder, VarMap};

/// Convolution followed by batch normalization and an optional ReLU.
#[derive(Debug, Clone)]
pub struct ConvBlock {
    conv: Conv1d,
    norm: BatchNorm,
    activate: bool,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
}

impl ConvBlock {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        activate: bool,
        vb: VarBuilder,
    ) -> candle_core::Result<Self> {
        let cfg = Conv1dConfig {
            padding,
            stride,
            ..Default::default()
        };
        let conv = candle_nn::conv1d(in_channels, out_channels, kernel_size, cfg, vb.pp("conv"))?;
        let norm = candle_nn::batch_norm(out_channels, BatchNormConfig::default(), vb.pp("bn"))?;
        Ok(Self {
            conv,
            norm,
            activate,
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        })
    }

    pub fn is_activated(&self) -> bool {
        self.activate
    }
}

impl ModuleT for ConvBlock {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let ys = self.conv.forward(xs)?;
        let ys = self.norm.forward_t(&ys, train)?;
        if self.activate {
            ys.relu()
        } else {
            Ok(ys)
        }
    }
}

/// One step of the layer pipeline.
#[derive(Debug, Clone)]
pub enum Stage {
    Conv(ConvBlock),
    Flatten,
    Linear {
        layer: Linear,
        in_features: usize,
        out_features: usize,
    },
    BatchNorm {
        layer: BatchNorm,
        features: usize,
    },
    Relu,
}

/// Shape-level description of a [`Stage`], for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Conv {
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    },
    Flatten,
    Linear {
        in_features: usize,
        out_features: usize,
    },
    BatchNorm {
        features: usize,
    },
    Relu,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageKind::Conv {
                in_channels,
                out_channels,
                kernel_size,
                stride,
                padding,
            } => write!(
                f,
                "Conv1d({in_channels} -> {out_channels}, kernel={kernel_size}, stride={stride}, padding={padding}) + BatchNorm + ReLU"
            ),
            StageKind::Flatten => write!(f, "Flatten"),
            StageKind::Linear {
                in_features,
                out_features,
            } => write!(f, "Linear({in_features} -> {out_features})"),
            StageKind::BatchNorm { features } => write!(f, "BatchNorm({features})"),
            StageKind::Relu => write!(f, "ReLU"),
        }
    }
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Conv(block) => StageKind::Conv {
                in_channels: block.in_channels,
                out_channels: block.out_channels,
                kernel_size: block.kernel_size,
                stride: block.stride,
                padding: block.padding,
            },
            Stage::Flatten => StageKind::Flatten,
            Stage::Linear {
                in_features,
                out_features,
                ..
            } => StageKind::Linear {
                in_features: *in_features,
                out_features: *out_features,
            },
            Stage::BatchNorm { features, .. } => StageKind::BatchNorm {
                features: *features,
            },
            Stage::Relu => StageKind::Relu,
        }
    }
}

impl ModuleT for Stage {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        match self {
            Stage::Conv(block) => block.forward_t(xs, train),
            // Keep the batch dimension, merge everything else.
            Stage::Flatten => xs.flatten_from(1),
            Stage::Linear { layer, .. } => layer.forward(xs),
            Stage::BatchNorm { layer, .. } => layer.forward_t(xs, train),
            Stage::Relu => xs.relu(),
        }
    }
}

/// Sequential 1-D CNN ending in a sigmoid probability per example.
pub struct BinaryClassifier {
    stages: Vec<Stage>,
    varmap: VarMap,
    device: Device,
}

impl BinaryClassifier {
    /// Build the layer stack with freshly initialised parameters.
    pub fn new(config: &ClassifierConfig, device: &Device) -> Result<Self, ModelError> {
        config.validate()?;

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let mut stages = Vec::new();

        for i in 0..config.num_conv_blocks() {
            let block = ConvBlock::new(
                config.channel_sizes[i],
                config.channel_sizes[i + 1],
                config.kernel_sizes[i],
                config.strides[i],
                config.paddings[i],
                true,
                vb.pp(format!("conv_block{i}")),
            )?;
            stages.push(Stage::Conv(block));
        }

        stages.push(Stage::Flatten);

        let last = config.linear_layer_sizes.len() - 1;
        let mut in_features = config.channel_sizes[config.channel_sizes.len() - 1];
        for (i, &out_features) in config.linear_layer_sizes.iter().enumerate() {
            let layer = candle_nn::linear(in_features, out_features, vb.pp(format!("fc{i}")))?;
            stages.push(Stage::Linear {
                layer,
                in_features,
                out_features,
            });
            if i == last {
                let norm = candle_nn::batch_norm(
                    out_features,
                    BatchNormConfig::default(),
                    vb.pp(format!("fc{i}_bn")),
                )?;
                stages.push(Stage::BatchNorm {
                    layer: norm,
                    features: out_features,
                });
                stages.push(Stage::Relu);
            }
            in_features = out_features;
        }

        tracing::debug!(stages = stages.len(), "Built binary classifier");

        Ok(Self {
            stages,
            varmap,
            device: device.clone(),
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage kinds in evaluation order.
    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Parameters and normalization statistics, for external training code.
    pub fn var_map(&self) -> &VarMap {
        &self.varmap
    }

    /// Total number of stored values, running statistics included.
    pub fn num_parameters(&self) -> usize {
        self.varmap
            .all_vars()
            .iter()
            .map(|v| v.elem_count())
            .sum()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Evaluation-mode forward pass: `[B, C0, T]` in, `[B]` probabilities out.
    ///
    /// Parameters are f32, so large activations saturate the sigmoid to
    /// exactly 1.0; values below 0.5 never occur because of the final ReLU.
    pub fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        self.forward_t(xs, false)
    }
}

impl ModuleT for BinaryClassifier {
    fn forward_t(&self, xs: &Tensor, train: bool) -> candle_core::Result<Tensor> {
        let mut ys = xs.clone();
        for stage in &self.stages {
            ys = stage.forward_t(&ys, train)?;
        }
        let probs = candle_nn::ops::sigmoid(&ys)?;
        if probs.rank() == 2 && probs.dim(1)? == 1 {
            probs.squeeze(1)
        } else {
            Ok(probs)
        }
    }
}

impl std::fmt::Debug for BinaryClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryClassifier")
            .field("stages", &self.kinds())
            .field("device", &self.device)
            .finish()
    }
}

/// Build a classifier on `device` from its five size lists.
pub fn build_model(config: &ClassifierConfig, device: &Device) -> Result<BinaryClassifier, ModelError> {
    BinaryClassifier::new(config, device)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ClassifierConfig {
        ClassifierConfig::new(vec![3, 8, 16], vec![5, 5], vec![1, 1], vec![0, 0], vec![32, 1])
    }

    #[test]
    fn test_stage_order() {
        let model = build_model(&small_config(), &Device::Cpu).unwrap();
        let kinds = model.kinds();
        assert_eq!(kinds.len(), 7);
        assert!(matches!(
            kinds[0],
            StageKind::Conv {
                in_channels: 3,
                out_channels: 8,
                kernel_size: 5,
                ..
            }
        ));
        assert!(matches!(
            kinds[1],
            StageKind::Conv {
                in_channels: 8,
                out_channels: 16,
                ..
            }
        ));
        assert_eq!(kinds[2], StageKind::Flatten);
        assert_eq!(
            kinds[3],
            StageKind::Linear {
                in_features: 16,
                out_features: 32
            }
        );
        assert_eq!(
            kinds[4],
            StageKind::Linear {
                in_features: 32,
                out_features: 1
            }
        );
        assert_eq!(kinds[5], StageKind::BatchNorm { features: 1 });
        assert_eq!(kinds[6], StageKind::Relu);
    }

    #[test]
    fn test_every_conv_block_is_activated() {
        let model = build_model(&small_config(), &Device::Cpu).unwrap();
        for stage in model.stages() {
            if let Stage::Conv(block) = stage {
                assert!(block.is_activated());
            }
        }
    }

    #[test]
    fn test_parameters_are_registered() {
        let model = build_model(&small_config(), &Device::Cpu).unwrap();
        // conv0: 8*3*5 + 8, bn0: 4*8, conv1: 16*8*5 + 16, bn1: 4*16,
        // fc0: 32*16 + 32, fc1: 32 + 1, fc1_bn: 4
        let expected = (120 + 8) + 32 + (640 + 16) + 64 + (512 + 32) + 33 + 4;
        assert_eq!(model.num_parameters(), expected);
    }

    #[test]
    fn test_display_kinds() {
        let text = StageKind::Linear {
            in_features: 16,
            out_features: 32,
        }
        .to_string();
        assert_eq!(text, "Linear(16 -> 32)");
    }
}
