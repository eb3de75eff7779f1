//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{Affine, ImageVolume, LabelVolume, Orientation, SliceAxis, SlicePredictions};
pub use crate::error::{SegError, SegResult};

pub use crate::consts::{DEFAULT_KERNEL_SIZE, DEFAULT_THRESHOLD};

pub use crate::recon::{reconstruct_like, save_prediction};

pub use crate::metrics::{default_metrics, dice_score, Measure, MetricManager, NamedMetric, Summary};

pub use crate::evaluation::Evaluation3d;

pub use crate::heatmap::{disc_heatmap, extract_points, heatmap_generation, LabelAim, PointLabel};

pub use crate::post_proc::threshold_predictions;

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, BidsLayout};
