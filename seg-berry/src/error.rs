//! 运行时错误.

use std::io;

use thiserror::Error;

/// 切片重建、指标计算与热图生成的运行时错误.
#[derive(Debug, Error)]
pub enum SegError {
    /// 形状不一致. 适用于预测/真值对、切片之间以及批次长度.
    #[error("形状不一致: 期望 {expected:?}, 实际 {found:?}")]
    ShapeMismatch {
        /// 期望的形状.
        expected: Vec<usize>,
        /// 实际的形状.
        found: Vec<usize>,
    },

    /// 至少需要一个输入, 但输入为空.
    #[error("输入为空: {0}")]
    EmptyInput(&'static str),

    /// 比例类指标的分母为零 (例如真值体积为空).
    #[error("除零: {0}")]
    DivideByZero(&'static str),

    /// 切片轴不在 {0, 1, 2} 中.
    #[error("非法切片轴 {0}, 仅支持 0 (矢状), 1 (冠状), 2 (轴向)")]
    InvalidAxis(usize),

    /// 同一切片索引被重复提交.
    #[error("切片索引 {0} 重复")]
    DuplicateSlice(usize),

    /// 切片索引越界. 第一个参数为索引, 第二个参数为该轴长度.
    #[error("切片索引 {0} 越界 (轴长度 {1})")]
    SliceOutOfRange(usize, usize),

    /// 仿射矩阵退化, 无法确定体素轴方向.
    #[error("仿射矩阵退化: 第 {0} 个体素轴方向为零")]
    DegenerateAffine(usize),

    /// 非法的标签选择参数. 只接受 `-1` 或正整数.
    #[error("非法的标签选择 {0}, 只接受 -1 或正整数")]
    InvalidAim(i32),

    /// 某个指标函数执行失败.
    #[error("指标 `{name}` 计算失败: {source}")]
    Metric {
        /// 指标名称.
        name: &'static str,
        /// 底层错误.
        #[source]
        source: Box<SegError>,
    },

    /// nifti 读写错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 统计分布参数非法.
    #[error(transparent)]
    Stats(#[from] statrs::StatsError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SegError {
    /// 由两个形状构造 `ShapeMismatch`.
    #[inline]
    pub(crate) fn shape_mismatch(expected: &[usize], found: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// 本 crate 的运行时结果.
pub type SegResult<T> = Result<T, SegError>;
