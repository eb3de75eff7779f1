//! 体素轴方向 (orientation) 的计算与变换.
//!
//! 一个 [`Orientation`] 记录了每个 **输入** 体素轴对应的 **输出** 轴以及是否翻转.
//! 以 RAS 方向 (即 `i -> R`, `j -> A`, `k -> S`) 为规范方向 (canonical).
//!
//! 变换规则和常见神经影像库一致: 先按 `flip` 翻转输入轴, 再转置使输入轴 `i`
//! 落在输出轴 `axis[i]` 上.

use std::fmt;

use ndarray::{Array2, Array3, ArrayView3, Axis};

use super::affine::Affine;
use crate::error::{SegError, SegResult};
use crate::Idx3d;

/// 列向量被视为零向量时的阈值.
const ZERO_TOL: f64 = 1e-12;

/// 各输出轴正/负方向的字母编码.
const AXIS_LABELS: [(char, char); 3] = [('L', 'R'), ('P', 'A'), ('I', 'S')];

/// 单个体素轴的映射.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AxisMap {
    /// 输出轴.
    pub axis: usize,
    /// 是否翻转.
    pub flip: bool,
}

/// 三维体素轴方向, 也可以看作两个方向之间的变换.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Orientation([AxisMap; 3]);

impl Default for Orientation {
    #[inline]
    fn default() -> Self {
        Self::ras()
    }
}

/// 以 `RAS` 形式的轴编码输出.
impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.axcodes())
    }
}

/// 计算仿射矩阵 `affine` 的体素轴方向.
///
/// 各列先归一化, 再按列最小值升序访问输入轴 (与 nibabel 的 `io_orientation` 一致),
/// 贪心地选取列向量中绝对值最大的分量作为输出轴, 并将该行清零,
/// 避免两个输入轴映射到同一输出轴. 不做 SVD 正交化.
///
/// 若某个体素轴方向为零 (仿射矩阵退化), 返回 `Err(SegError::DegenerateAffine)`.
pub fn io_orientation(affine: &Affine) -> SegResult<Orientation> {
    let mut rs: Array2<f64> = affine.rotation_zoom().to_owned();
    for (c, mut col) in rs.axis_iter_mut(Axis(1)).enumerate() {
        let norm = col.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm <= ZERO_TOL {
            return Err(SegError::DegenerateAffine(c));
        }
        col.mapv_inplace(|v| v / norm);
    }

    let mut maps = [AxisMap {
        axis: 0,
        flip: false,
    }; 3];
    let col_min = |c: usize| rs.column(c).iter().copied().fold(f64::INFINITY, f64::min);
    let mut order = [0, 1, 2];
    order.sort_by(|&a, &b| col_min(a).total_cmp(&col_min(b)));
    for in_ax in order {
        let col = rs.column(in_ax);
        let (out_ax, val) = col
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f64), |acc, (i, v)| {
                if v.abs() > acc.1.abs() {
                    (i, v)
                } else {
                    acc
                }
            });
        if val.abs() <= ZERO_TOL {
            return Err(SegError::DegenerateAffine(in_ax));
        }
        maps[in_ax] = AxisMap {
            axis: out_ax,
            flip: val < 0.0,
        };
        rs.row_mut(out_ax).fill(0.0);
    }
    Ok(Orientation(maps))
}

impl Orientation {
    /// 规范的 RAS 方向, 同时也是恒等变换.
    #[inline]
    pub const fn ras() -> Self {
        Self([
            AxisMap {
                axis: 0,
                flip: false,
            },
            AxisMap {
                axis: 1,
                flip: false,
            },
            AxisMap {
                axis: 2,
                flip: false,
            },
        ])
    }

    /// 直接由三个轴映射构造. 若输出轴不是 `{0, 1, 2}` 的排列, 返回 `None`.
    pub fn new(maps: [AxisMap; 3]) -> Option<Self> {
        let mut seen = [false; 3];
        for m in maps.iter() {
            if m.axis > 2 || seen[m.axis] {
                return None;
            }
            seen[m.axis] = true;
        }
        Some(Self(maps))
    }

    /// 各输入轴的映射.
    #[inline]
    pub fn maps(&self) -> &[AxisMap; 3] {
        &self.0
    }

    /// 是否为 RAS 方向 (恒等变换)?
    #[inline]
    pub fn is_canonical(&self) -> bool {
        *self == Self::ras()
    }

    /// 轴编码, 如 `"RAS"`, `"LPS"`.
    pub fn axcodes(&self) -> String {
        self.0
            .iter()
            .map(|m| {
                let (neg, pos) = AXIS_LABELS[m.axis];
                if m.flip {
                    neg
                } else {
                    pos
                }
            })
            .collect()
    }

    /// 计算从方向 `self` 到方向 `end` 的变换.
    ///
    /// 两者都是合法方向时总能找到对应的输出轴.
    pub fn transform_to(&self, end: &Orientation) -> Orientation {
        let mut result = Self::ras().0;
        for (end_in, end_map) in end.0.iter().enumerate() {
            // 合法方向的输出轴是排列, 一定能找到.
            if let Some((start_in, start_map)) = self
                .0
                .iter()
                .enumerate()
                .find(|(_, m)| m.axis == end_map.axis)
            {
                result[start_in] = AxisMap {
                    axis: end_in,
                    flip: start_map.flip != end_map.flip,
                };
            }
        }
        Self(result)
    }

    /// 逆变换. `self.apply` 之后再 `self.inverse().apply` 得到原数组.
    pub fn inverse(&self) -> Orientation {
        let mut result = Self::ras().0;
        for (in_ax, m) in self.0.iter().enumerate() {
            result[m.axis] = AxisMap {
                axis: in_ax,
                flip: m.flip,
            };
        }
        Self(result)
    }

    /// 对三维数组实施该变换: 先翻转, 后转置. 返回标准布局的新数组.
    pub fn apply<T: Clone>(&self, arr: ArrayView3<'_, T>) -> Array3<T> {
        let mut view = arr;
        for (ax, m) in self.0.iter().enumerate() {
            if m.flip {
                view.invert_axis(Axis(ax));
            }
        }
        let mut perm = [0usize; 3];
        for (in_ax, m) in self.0.iter().enumerate() {
            perm[m.axis] = in_ax;
        }
        view.permuted_axes(perm).as_standard_layout().into_owned()
    }

    /// 变换后的数组形状. `shape` 为变换前形状.
    pub fn apply_shape(&self, shape: Idx3d) -> Idx3d {
        let src = [shape.0, shape.1, shape.2];
        let mut dst = [0usize; 3];
        for (in_ax, m) in self.0.iter().enumerate() {
            dst[m.axis] = src[in_ax];
        }
        (dst[0], dst[1], dst[2])
    }

    /// 将 **变换后** 的体素索引映射回 **变换前** 体素索引的仿射矩阵.
    ///
    /// `shape` 为变换前的数组形状. 变换后数组的仿射矩阵为 `affine · self.inv_affine(shape)`.
    pub fn inv_affine(&self, shape: Idx3d) -> Affine {
        let shape = [shape.0, shape.1, shape.2];
        let mut reorder = [[0.0; 4]; 4];
        let mut flip = [[0.0; 4]; 4];
        reorder[3][3] = 1.0;
        flip[3][3] = 1.0;
        for (r, m) in self.0.iter().enumerate() {
            reorder[r][m.axis] = 1.0;
            let sign = if m.flip { -1.0 } else { 1.0 };
            let center = -((shape[r].max(1) - 1) as f64) / 2.0;
            flip[r][r] = sign;
            flip[r][3] = sign * center - center;
        }
        Affine::from_rows(flip).dot(&Affine::from_rows(reorder))
    }
}

#[cfg(test)]
mod tests {
    use super::{io_orientation, AxisMap, Orientation};
    use crate::data::affine::Affine;
    use crate::error::SegError;
    use ndarray::Array3;

    fn ramp(shape: (usize, usize, usize)) -> Array3<f32> {
        let n = shape.0 * shape.1 * shape.2;
        Array3::from_shape_vec(shape, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    /// 一个既有转置又有翻转的方向: `i -> S`, `j -> L`, `k -> P`.
    fn odd_orientation() -> Orientation {
        Orientation::new([
            AxisMap {
                axis: 2,
                flip: false,
            },
            AxisMap {
                axis: 0,
                flip: true,
            },
            AxisMap {
                axis: 1,
                flip: true,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_axcodes() {
        assert_eq!(Orientation::ras().axcodes(), "RAS");
        let lps = io_orientation(&Affine::from_diagonal([-1.0, -1.0, 1.0])).unwrap();
        assert_eq!(lps.to_string(), "LPS");
        assert_eq!(odd_orientation().axcodes(), "SLP");
    }

    #[test]
    fn test_io_orientation_permuted() {
        // i -> -y, j -> x, k -> z.
        let aff = Affine::from_rows([
            [0.0, 0.9, 0.0, 0.0],
            [-1.2, 0.1, 0.0, 0.0],
            [0.0, 0.0, 3.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let ornt = io_orientation(&aff).unwrap();
        assert_eq!(ornt.axcodes(), "PRS");
    }

    #[test]
    fn test_io_orientation_oblique() {
        // Rz(10°) Ry(30°) Rx(50°), 体素尺寸 (2, 1.5, 3).
        // 按列序访问会得到 "RAS"; 按列最小值升序访问得到 "RSP".
        let r = [
            [0.852_869, 0.265_584, 0.449_533],
            [0.150_384, 0.699_533, -0.698_597],
            [-0.5, 0.663_414, 0.556_67],
        ];
        let z = [2.0, 1.5, 3.0];
        let row = |i: usize| [r[i][0] * z[0], r[i][1] * z[1], r[i][2] * z[2], 0.0];
        let aff = Affine::from_rows([row(0), row(1), row(2), [0.0, 0.0, 0.0, 1.0]]);
        let ornt = io_orientation(&aff).unwrap();
        assert_eq!(ornt.axcodes(), "RSP");
    }

    #[test]
    fn test_io_orientation_degenerate() {
        let aff = Affine::from_diagonal([1.0, 0.0, 1.0]);
        assert!(matches!(
            io_orientation(&aff),
            Err(SegError::DegenerateAffine(1))
        ));
    }

    #[test]
    fn test_apply_then_inverse_is_identity() {
        let arr = ramp((2, 3, 4));
        let ornt = odd_orientation();
        let moved = ornt.apply(arr.view());
        assert_eq!(moved.dim(), ornt.apply_shape((2, 3, 4)));
        assert_eq!(moved.dim(), (3, 4, 2));
        assert_ne!(moved.iter().copied().collect::<Vec<_>>(), arr.iter().copied().collect::<Vec<_>>());

        let back = ornt.inverse().apply(moved.view());
        assert_eq!(back, arr);
    }

    #[test]
    fn test_apply_flip_moves_voxels() {
        let arr = ramp((2, 3, 4));
        let lps = io_orientation(&Affine::from_diagonal([-1.0, -1.0, 1.0])).unwrap();
        let to_ras = lps.transform_to(&Orientation::ras());
        let out = to_ras.apply(arr.view());
        assert_eq!(out.dim(), (2, 3, 4));
        assert_eq!(out[(0, 0, 0)], arr[(1, 2, 0)]);
        assert_eq!(out[(1, 2, 3)], arr[(0, 0, 3)]);
    }

    #[test]
    fn test_transform_between_orientations() {
        let start = odd_orientation();
        let ras = Orientation::ras();
        // 从 start 到 RAS 再到 start 得到恒等变换.
        let there = start.transform_to(&ras);
        let back = ras.transform_to(&start);
        assert_eq!(there.inverse(), back);
        assert!(start.transform_to(&start).is_canonical());
    }

    #[test]
    fn test_inv_affine_keeps_world_coordinates() {
        // LPS 体数据, 变换到 RAS 之后同一体素的物理坐标不变.
        let shape = (4, 5, 6);
        let aff = Affine::from_rows([
            [-2.0, 0.0, 0.0, 10.0],
            [0.0, -2.0, 0.0, 20.0],
            [0.0, 0.0, 3.0, -5.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let ornt = io_orientation(&aff).unwrap();
        let new_aff = aff.dot(&ornt.inv_affine(shape));

        // 原体素 (0, 0, 0) 在新数组中位于 (3, 4, 0).
        assert_eq!(aff.apply([0.0, 0.0, 0.0]), new_aff.apply([3.0, 4.0, 0.0]));
        assert!(io_orientation(&new_aff).unwrap().is_canonical());
    }
}
