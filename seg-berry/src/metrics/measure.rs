use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 指标的计算结果: 有定义的数值, 或者无定义 (如空集对空集的重叠度).
///
/// 以显式的 `Undefined` 代替 NaN, 避免其在算术中静默传播.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Measure {
    /// 有定义的数值.
    Defined(f64),
    /// 无定义.
    Undefined,
}

impl Measure {
    /// 计算 `num / den`. 分母为零时无定义.
    #[inline]
    pub fn ratio(num: f64, den: f64) -> Self {
        if den == 0.0 {
            Self::Undefined
        } else {
            Self::Defined(num / den)
        }
    }

    /// 从可能为 NaN 的浮点数转换. NaN 视为无定义.
    #[inline]
    pub fn from_f64(v: f64) -> Self {
        if v.is_nan() {
            Self::Undefined
        } else {
            Self::Defined(v)
        }
    }

    /// 有定义时返回数值.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined => None,
        }
    }

    /// 是否有定义?
    #[inline]
    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }

    /// 是否无定义?
    #[inline]
    pub fn is_undefined(&self) -> bool {
        !self.is_defined()
    }

    /// 忽略无定义值求平均. 若没有任何有定义的值, 返回 `Undefined`.
    pub fn mean<'a, I: IntoIterator<Item = &'a Measure>>(it: I) -> Self {
        let (sum, count) = it
            .into_iter()
            .filter_map(Measure::value)
            .fold((0.0, 0u64), |(s, c), v| (s + v, c + 1));
        Self::ratio(sum, count as f64)
    }
}

impl From<Option<f64>> for Measure {
    #[inline]
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Undefined, Self::Defined)
    }
}

impl From<Measure> for Option<f64> {
    #[inline]
    fn from(value: Measure) -> Self {
        value.value()
    }
}

/// 无定义值显示为 `/`.
impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(v) => write!(f, "{v:.6}"),
            Self::Undefined => write!(f, "/"),
        }
    }
}
