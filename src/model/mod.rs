//! One-dimensional CNN for binary time-series classification.
//!
//! # Architecture
//!
//! ```text
//! [B, C0, T]
//!     │
//!     ▼
//! ┌──────────────────────────────┐
//! │ Conv1d → BatchNorm → ReLU    │  × (channel_sizes.len() - 1)
//! └──────────────────────────────┘
//!     │
//!     ▼
//!  Flatten  [B, C_last * T_last]
//!     │
//!     ▼
//!  Linear → ... → Linear → BatchNorm → ReLU
//!     │
//!     ▼
//!  Sigmoid  [B]
//! ```
//!
//! Only the last linear layer is followed by normalization and a ReLU.
//! The first linear layer takes `C_last` inputs, so the convolution stack
//! must shrink the time axis to length 1; no shape inference is done.

mod classifier;
mod config;
mod error;

pub use classifier::{build_model, BinaryClassifier, ConvBlock, Stage, StageKind};
pub use config::ClassifierConfig;
pub use error::ModelError;
