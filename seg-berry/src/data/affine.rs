//! 体素索引到物理 (扫描仪) 坐标的 4x4 仿射变换.

use ndarray::{arr2, s, Array2, ArrayView2};
use nifti::NiftiHeader;

use crate::Idx3d;

/// 4x4 齐次仿射矩阵. 前三列分别对应体素轴 `i`, `j`, `k`, 最后一列为原点.
///
/// 该结构是只读的. 所有变换都会返回新的实例.
#[derive(Clone, Debug, PartialEq)]
pub struct Affine(Array2<f64>);

impl Default for Affine {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    /// 单位矩阵, 即体素尺寸为 1 mm 的 RAS 方向.
    #[inline]
    pub fn identity() -> Self {
        Self(Array2::eye(4))
    }

    /// 按行构造. 最后一行应为 `[0, 0, 0, 1]`, 本方法不做检查.
    #[inline]
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(arr2(&rows))
    }

    /// 对角仿射矩阵, 原点位于 `(0, 0, 0)`. 负值代表该轴翻转.
    pub fn from_diagonal(zooms: [f64; 3]) -> Self {
        let mut m = Array2::eye(4);
        for (i, z) in zooms.into_iter().enumerate() {
            m[(i, i)] = z;
        }
        Self(m)
    }

    /// 从 nifti header 获取最佳仿射矩阵.
    ///
    /// 1. `sform_code > 0` 时使用 `srow_{x, y, z}`;
    /// 2. 否则 `qform_code > 0` 时使用四元数和 `pixdim`;
    /// 3. 否则使用以体数据中心为原点、x 轴翻转的基础仿射矩阵.
    pub fn from_header(header: &NiftiHeader) -> Self {
        if header.sform_code > 0 {
            Self::from_sform(header)
        } else if header.qform_code > 0 {
            Self::from_qform(header)
        } else {
            let [_, x, y, z, ..] = header.dim;
            let [_, dx, dy, dz, ..] = header.pixdim;
            Self::base((x as usize, y as usize, z as usize), [dx as f64, dy as f64, dz as f64])
        }
    }

    fn from_sform(header: &NiftiHeader) -> Self {
        let row = |r: [f32; 4]| r.map(f64::from);
        Self::from_rows([
            row(header.srow_x),
            row(header.srow_y),
            row(header.srow_z),
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    fn from_qform(header: &NiftiHeader) -> Self {
        let (b, c, d) = (
            header.quatern_b as f64,
            header.quatern_c as f64,
            header.quatern_d as f64,
        );
        // 数值误差可能导致根号内略小于 0.
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let rot = [
            [
                a * a + b * b - c * c - d * d,
                2.0 * (b * c - a * d),
                2.0 * (b * d + a * c),
            ],
            [
                2.0 * (b * c + a * d),
                a * a + c * c - b * b - d * d,
                2.0 * (c * d - a * b),
            ],
            [
                2.0 * (b * d - a * c),
                2.0 * (c * d + a * b),
                a * a + d * d - b * b - c * c,
            ],
        ];
        let [qfac, dx, dy, dz, ..] = header.pixdim;
        let qfac = if qfac < 0.0 { -1.0 } else { 1.0 };
        let zooms = [dx as f64, dy as f64, dz as f64 * qfac];
        let offset = [
            header.quatern_x as f64,
            header.quatern_y as f64,
            header.quatern_z as f64,
        ];

        let mut m = Array2::eye(4);
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] = rot[r][c] * zooms[c];
            }
            m[(r, 3)] = offset[r];
        }
        Self(m)
    }

    /// 以体数据中心为原点、x 轴翻转的基础仿射矩阵.
    pub fn base((x, y, z): Idx3d, zooms: [f64; 3]) -> Self {
        let shape = [x, y, z];
        let zooms = [-zooms[0], zooms[1], zooms[2]];
        let mut m = Self::from_diagonal(zooms).0;
        for i in 0..3 {
            let origin = (shape[i].max(1) - 1) as f64 / 2.0;
            m[(i, 3)] = -origin * zooms[i];
        }
        Self(m)
    }

    /// 获得底层 4x4 矩阵视图.
    #[inline]
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.0.view()
    }

    /// 左上角 3x3 的旋转-缩放部分.
    #[inline]
    pub fn rotation_zoom(&self) -> ArrayView2<'_, f64> {
        self.0.slice(s![..3, ..3])
    }

    /// 各体素轴的尺寸 (列范数), 以毫米为单位.
    pub fn zooms(&self) -> [f64; 3] {
        let rz = self.rotation_zoom();
        [0, 1, 2].map(|c| rz.column(c).iter().map(|v| v * v).sum::<f64>().sqrt())
    }

    /// 矩阵乘法 `self · rhs`.
    #[inline]
    pub fn dot(&self, rhs: &Affine) -> Affine {
        Self(self.0.dot(&rhs.0))
    }

    /// 将原点平移到体素索引 `voxel` 处, 其余不变.
    pub fn translated_to_voxel(&self, voxel: [f64; 3]) -> Affine {
        let origin = self.apply(voxel);
        let mut m = self.0.clone();
        for (r, o) in origin.into_iter().enumerate() {
            m[(r, 3)] = o;
        }
        Self(m)
    }

    /// 计算体素坐标 `ijk` 对应的物理坐标.
    pub fn apply(&self, ijk: [f64; 3]) -> [f64; 3] {
        [0, 1, 2].map(|r| {
            (0..3).map(|c| self.0[(r, c)] * ijk[c]).sum::<f64>() + self.0[(r, 3)]
        })
    }

    /// 以 `tol` 为容差逐元素比较两个仿射矩阵.
    pub fn approx_eq(&self, other: &Affine, tol: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// 将仿射矩阵以 sform 形式写入 `header`, 并同步 `pixdim`.
    ///
    /// qform 会被置为未知 (`qform_code = 0`), 读取时以 sform 为准.
    pub fn write_into(&self, header: &mut NiftiHeader) {
        let row = |r: usize| [0, 1, 2, 3].map(|c| self.0[(r, c)] as f32);
        header.srow_x = row(0);
        header.srow_y = row(1);
        header.srow_z = row(2);
        if header.sform_code <= 0 {
            // NIFTI_XFORM_ALIGNED_ANAT
            header.sform_code = 2;
        }
        header.qform_code = 0;

        let [dx, dy, dz] = self.zooms();
        header.pixdim[0] = 1.0;
        header.pixdim[1] = dx as f32;
        header.pixdim[2] = dy as f32;
        header.pixdim[3] = dz as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::Affine;
    use nifti::NiftiHeader;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_zooms_of_rotated_affine() {
        // i -> -y, j -> x, k -> z, 体素尺寸 (2, 3, 4).
        let aff = Affine::from_rows([
            [0.0, 3.0, 0.0, 10.0],
            [-2.0, 0.0, 0.0, 20.0],
            [0.0, 0.0, 4.0, 30.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let [dx, dy, dz] = aff.zooms();
        assert!(f64_eq(dx, 2.0) && f64_eq(dy, 3.0) && f64_eq(dz, 4.0));
        assert_eq!(aff.apply([0.0, 0.0, 0.0]), [10.0, 20.0, 30.0]);
        assert_eq!(aff.apply([1.0, 1.0, 1.0]), [13.0, 18.0, 34.0]);
    }

    #[test]
    fn test_header_sform_round_trip() {
        let aff = Affine::from_rows([
            [-1.5, 0.0, 0.0, 90.0],
            [0.0, 1.5, 0.0, -126.0],
            [0.0, 0.0, 2.0, -72.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let mut header = NiftiHeader::default();
        // 已有的正 sform_code (NIFTI_XFORM_SCANNER_ANAT) 保持不变.
        header.sform_code = 1;
        aff.write_into(&mut header);
        assert_eq!(header.sform_code, 1);
        assert_eq!(header.qform_code, 0);
        assert!(Affine::from_header(&header).approx_eq(&aff, 1e-6));
        assert!(f64_eq(header.pixdim[1] as f64, 1.5));

        // 未设置 sform 时写入 2.
        header.sform_code = 0;
        aff.write_into(&mut header);
        assert_eq!(header.sform_code, 2);
        assert!(Affine::from_header(&header).approx_eq(&aff, 1e-6));
    }

    #[test]
    fn test_header_qform() {
        // 绕 z 轴旋转 180 度: (b, c, d) = (0, 0, 1).
        let mut header = NiftiHeader::default();
        header.sform_code = 0;
        header.qform_code = 1;
        header.quatern_d = 1.0;
        header.pixdim = [1.0, 2.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0];
        header.quatern_x = 5.0;
        let aff = Affine::from_header(&header);
        let expected = Affine::from_rows([
            [-2.0, 0.0, 0.0, 5.0],
            [0.0, -2.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(aff.approx_eq(&expected, 1e-6));

        // qfac = -1 翻转 k 轴.
        header.pixdim[0] = -1.0;
        let aff = Affine::from_header(&header);
        assert!(f64_eq(aff.view()[(2, 2)], -3.0));
    }

    #[test]
    fn test_base_affine_is_centered() {
        let aff = Affine::base((5, 3, 1), [2.0, 1.0, 1.0]);
        assert_eq!(aff.apply([2.0, 1.0, 0.0]), [0.0, 0.0, 0.0]);
        assert!(f64_eq(aff.view()[(0, 0)], -2.0));
    }

    #[test]
    fn test_translated_to_voxel() {
        let aff = Affine::from_diagonal([2.0, 2.0, 2.0]);
        let moved = aff.translated_to_voxel([3.0, 0.0, 1.0]);
        assert_eq!(moved.apply([0.0, 0.0, 0.0]), [6.0, 0.0, 2.0]);
        assert_eq!(moved.zooms(), [2.0, 2.0, 2.0]);
    }
}
