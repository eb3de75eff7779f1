//! 稀疏单体素标注到高斯热图.
//!
//! 椎间盘标注是每个椎间盘一个体素的稀疏标注. 用于训练定位网络时,
//! 先提取标注点, 投影到正中矢状面, 再以归一化高斯核卷积得到热图.

pub mod disc;
mod kernel;
mod points;

pub use disc::{disc_heatmap, mid_sagittal_image, mid_slice_average, points_heatmap, DiscHeatmap};
pub use kernel::{gaussian_kernel, heatmap_generation};
pub use points::{extract_points, extract_points_from_array, LabelAim, PointLabel};
