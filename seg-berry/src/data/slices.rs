//! 逐切片预测的集合.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array2;

use crate::error::{SegError, SegResult};
use crate::Idx3d;

/// 切片轴.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum SliceAxis {
    /// 矢状面, 沿第 0 轴切片.
    Sagittal,
    /// 冠状面, 沿第 1 轴切片.
    Coronal,
    /// 轴向 (水平) 面, 沿第 2 轴切片.
    Axial,
}

impl SliceAxis {
    /// 对应的数组轴编号.
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            SliceAxis::Sagittal => 0,
            SliceAxis::Coronal => 1,
            SliceAxis::Axial => 2,
        }
    }
}

impl TryFrom<usize> for SliceAxis {
    type Error = SegError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SliceAxis::Sagittal),
            1 => Ok(SliceAxis::Coronal),
            2 => Ok(SliceAxis::Axial),
            any_else => Err(SegError::InvalidAxis(any_else)),
        }
    }
}

impl fmt::Display for SliceAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceAxis::Sagittal => write!(f, "sagittal"),
            SliceAxis::Coronal => write!(f, "coronal"),
            SliceAxis::Axial => write!(f, "axial"),
        }
    }
}

/// 沿某一切片轴的二维预测集合, 以及目标三维形状 (RAS 规范方向下).
///
/// 每个索引至多对应一个切片; 未提交的索引在重建时以全零填充.
#[derive(Clone, Debug)]
pub struct SlicePredictions {
    axis: SliceAxis,
    shape: Idx3d,
    slices: BTreeMap<usize, Array2<f32>>,
}

impl SlicePredictions {
    /// 创建空集合.
    pub fn new(axis: SliceAxis, shape: Idx3d) -> Self {
        Self {
            axis,
            shape,
            slices: BTreeMap::new(),
        }
    }

    /// 由 `(索引, 切片)` 序列一次性创建.
    ///
    /// 索引越界或重复时返回 `Err`.
    pub fn from_iter<I: IntoIterator<Item = (usize, Array2<f32>)>>(
        axis: SliceAxis,
        shape: Idx3d,
        it: I,
    ) -> SegResult<Self> {
        let mut ans = Self::new(axis, shape);
        for (index, slice) in it {
            ans.insert(index, slice)?;
        }
        Ok(ans)
    }

    /// 提交第 `index` 个切片.
    ///
    /// - 当 `index` 不小于切片轴长度时, 返回 `Err(SegError::SliceOutOfRange)`;
    /// - 当 `index` 已被提交过时, 返回 `Err(SegError::DuplicateSlice)`.
    pub fn insert(&mut self, index: usize, slice: Array2<f32>) -> SegResult<()> {
        let len = self.axis_len();
        if index >= len {
            return Err(SegError::SliceOutOfRange(index, len));
        }
        if self.slices.contains_key(&index) {
            return Err(SegError::DuplicateSlice(index));
        }
        self.slices.insert(index, slice);
        Ok(())
    }

    /// 切片轴.
    #[inline]
    pub fn axis(&self) -> SliceAxis {
        self.axis
    }

    /// 目标三维形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.shape
    }

    /// 切片轴的长度, 即完整切片个数.
    #[inline]
    pub fn axis_len(&self) -> usize {
        let (x, y, z) = self.shape;
        [x, y, z][self.axis.index()]
    }

    /// 已提交的切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// 是否没有任何切片?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// 获取第 `index` 个已提交的切片.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Array2<f32>> {
        self.slices.get(&index)
    }

    /// 按索引升序迭代已提交的切片.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &Array2<f32>)> {
        self.slices.iter().map(|(i, s)| (*i, s))
    }
}

#[cfg(test)]
mod tests {
    use super::{SliceAxis, SlicePredictions};
    use crate::error::SegError;
    use ndarray::Array2;

    #[test]
    fn test_slice_axis_try_from() {
        assert_eq!(SliceAxis::try_from(0).unwrap(), SliceAxis::Sagittal);
        assert_eq!(SliceAxis::try_from(2).unwrap().index(), 2);
        assert!(matches!(SliceAxis::try_from(3), Err(SegError::InvalidAxis(3))));
    }

    #[test]
    fn test_insert_rejects_bad_index() {
        let mut p = SlicePredictions::new(SliceAxis::Coronal, (2, 3, 4));
        assert_eq!(p.axis_len(), 3);
        p.insert(2, Array2::zeros((2, 4))).unwrap();
        assert!(matches!(
            p.insert(2, Array2::zeros((2, 4))),
            Err(SegError::DuplicateSlice(2))
        ));
        assert!(matches!(
            p.insert(3, Array2::zeros((2, 4))),
            Err(SegError::SliceOutOfRange(3, 3))
        ));
        assert_eq!(p.len(), 1);
    }
}
