//! 3D 体数据、仿射几何与体素轴方向.

pub mod affine;
pub mod orientation;
pub mod slices;
mod volume;

pub use affine::Affine;
pub use orientation::{io_orientation, AxisMap, Orientation};
pub use slices::{SliceAxis, SlicePredictions};
pub use volume::{ImageVolume, LabelVolume, Volume};
