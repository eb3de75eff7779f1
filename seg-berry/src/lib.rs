#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供医学影像分割流程中推理之后的数值部分: 逐切片预测的 3D 重建与方向还原,
//! 分割指标的流式汇总, 3D 体积评估, 以及椎间盘定位所需的高斯热图生成.
//!
//! 该 crate 仅提供 `safe` 接口. nii 文件的解析交给 `nifti` crate.
//!
//! # 注意
//!
//! 1. 体数据一律按 nifti 惯例以 `[i, j, k]` 顺序存储, 与仿射矩阵的前三列对应.
//! 2. 所有可恢复的错误以 [`SegError`] 返回. 无定义的指标值以 [`Measure::Undefined`]
//!   表示, 不会以 NaN 的形式出现.
//!
//! # 开发计划
//!
//! ### 仿射矩阵与体素轴方向 ✅
//!
//! sform/qform 解析, 体素轴方向码 (如 `"RAS"`, `"LPS"`), 方向变换及其逆,
//! 转换到最接近的 RAS 规范方向.
//!
//! 实现位于 `seg-berry/src/data`.
//!
//! ### 逐切片预测的 3D 重建 ✅
//!
//! 缺失切片以零填充, 堆叠后还原到参考影像的原始方向.
//!
//! 实现位于 `seg-berry/src/recon.rs`.
//!
//! ### 指标汇总 ✅
//!
//! 1. Dice, Hausdorff, 精确率, 召回率, 特异度, 交并比, 准确率. ✅
//! 2. 逐批记录, 汇总时忽略无定义值. 全部无定义时汇总值亦无定义. ✅
//! 3. 任一指标失败时整批不记录. ✅
//! 4. `rayon` 并行记录. ✅
//!
//! 实现位于 `seg-berry/src/metrics`.
//!
//! ### 3D 体积评估 ✅
//!
//! 相对体积差 `(vol_gt - vol_pred) / vol_gt` 保留符号, 真值为空时报错.
//!
//! 实现位于 `seg-berry/src/evaluation.rs`.
//!
//! ### 椎间盘热图 ✅
//!
//! 单体素标注点提取, 归一化高斯核, "same" 卷积, 正中矢状面平均.
//!
//! 实现位于 `seg-berry/src/heatmap`.
//!
//! ### BIDS 数据集布局 ✅
//!
//! 实现位于 `seg-berry/src/dataset`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D nii 体数据及其几何信息.
pub mod data;

pub use data::{
    io_orientation, Affine, AxisMap, ImageVolume, LabelVolume, Orientation, SliceAxis,
    SlicePredictions, Volume,
};

pub mod consts;

mod error;

pub use error::{SegError, SegResult};

pub mod recon;

pub use recon::{reconstruct, reconstruct_like, reconstruct_volume, save_prediction};

pub mod metrics;

pub use metrics::{Measure, MetricManager, Summary};

mod evaluation;

pub use evaluation::Evaluation3d;

pub mod heatmap;

pub mod post_proc;

pub mod dataset;
pub mod prelude;
