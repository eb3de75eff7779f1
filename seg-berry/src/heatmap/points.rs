use std::fmt;
use std::num::NonZeroU8;

use itertools::Itertools;
use ndarray::ArrayView3;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::disc;
use crate::data::LabelVolume;
use crate::error::{SegError, SegResult};

/// 单体素标注点 `(x, y, z, value)`, 坐标为 RAS 规范方向下的体素索引.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointLabel {
    /// 第 0 轴 (R) 索引.
    pub x: usize,
    /// 第 1 轴 (A) 索引.
    pub y: usize,
    /// 第 2 轴 (S) 索引.
    pub z: usize,
    /// 标签值.
    pub value: u8,
}

/// 需要提取的标签.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LabelAim {
    /// 所有椎间盘标签, 参见 [`disc::is_disc`].
    All,
    /// 仅提取该标签值.
    Only(NonZeroU8),
}

impl LabelAim {
    /// 标签值 `v` 是否被选中?
    #[inline]
    pub fn matches(&self, v: u8) -> bool {
        match self {
            LabelAim::All => disc::is_disc(v),
            LabelAim::Only(aim) => v == aim.get(),
        }
    }
}

/// `-1` 表示全部椎间盘标签, 正整数表示单个标签.
impl TryFrom<i32> for LabelAim {
    type Error = SegError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(LabelAim::All),
            v => u8::try_from(v)
                .ok()
                .and_then(NonZeroU8::new)
                .map(LabelAim::Only)
                .ok_or(SegError::InvalidAim(v)),
        }
    }
}

/// 与命令行取值一致: `-1` 或标签值. 用于输出文件名.
impl fmt::Display for LabelAim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelAim::All => write!(f, "-1"),
            LabelAim::Only(v) => write!(f, "{v}"),
        }
    }
}

/// 在 (已是规范方向的) 标注数组中提取被 `aim` 选中的非零体素.
///
/// 结果按标签值升序排列; 同一标签值的点保持体素的行优先顺序.
pub fn extract_points_from_array(arr: ArrayView3<'_, u8>, aim: LabelAim) -> Vec<PointLabel> {
    arr.indexed_iter()
        .filter(|&(_, &v)| v != disc::BACKGROUND && aim.matches(v))
        .map(|((x, y, z), &value)| PointLabel { x, y, z, value })
        .sorted_by_key(|p| p.value)
        .collect()
}

/// 先将 `label` 转换到 RAS 规范方向, 再提取标注点.
///
/// 仿射矩阵退化时返回 `Err`.
pub fn extract_points(label: &LabelVolume, aim: LabelAim) -> SegResult<Vec<PointLabel>> {
    let canonical = label.as_closest_canonical()?;
    let points = extract_points_from_array(canonical.data(), aim);
    log::debug!("extracted {} points (aim {aim})", points.len());
    Ok(points)
}
