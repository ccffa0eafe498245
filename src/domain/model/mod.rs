//! Transformer model for next-day return regression.

pub mod attention;
pub mod config;
pub mod encoder;
pub mod time2vec;
pub mod transformer;

pub use config::{CheckpointMeta, ModelConfig};
pub use transformer::ReturnCurveModel;
