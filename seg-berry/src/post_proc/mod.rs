//! 后处理流程集合.

mod threshold;

pub use threshold::{threshold_predictions, threshold_predictions_inplace};
