use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis, Ix3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use num::ToPrimitive;

use super::affine::Affine;
use super::orientation::{io_orientation, Orientation};
use crate::error::{SegError, SegResult};
use crate::Idx3d;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// nii 格式 3D 体数据, 包括 header、体素数组和仿射矩阵.
///
/// 体素数组按 nifti 惯例以 \[i, j, k\] 顺序存储, 与仿射矩阵的前三列一一对应.
/// 加载后不可变; 重定向等操作会返回新的体数据.
#[derive(Debug, Clone)]
pub struct Volume<T> {
    header: BoxedHeader,
    data: Array3<T>,
    affine: Affine,
}

/// 以 `f32` 保存体素值的影像 (或预测概率).
pub type ImageVolume = Volume<f32>;

/// 以 `u8` 保存标签值的标注.
pub type LabelVolume = Volume<u8>;

impl<T> Index<Idx3d> for Volume<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> IndexMut<Idx3d> for Volume<T> {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl<T> Volume<T> {
    /// 由体素数组和仿射矩阵直接创建体数据. header 由仿射矩阵和数组形状生成.
    pub fn from_parts(data: Array3<T>, affine: Affine) -> Self {
        Self::with_header(&NiftiHeader::default(), data, affine)
    }

    /// 以 `header` 为模板创建体数据. header 中的几何信息会被 `affine` 和 `data` 覆盖.
    pub fn with_header(header: &NiftiHeader, data: Array3<T>, affine: Affine) -> Self {
        let mut header = Box::new(header.clone());
        affine.write_into(&mut header);
        let (x, y, z) = data.dim();
        header.dim = [3, x as u16, y as u16, z as u16, 1, 1, 1, 1];
        Self {
            header,
            data,
            affine,
        }
    }

    /// 获取 header 部分.
    #[inline]
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// 获取仿射矩阵.
    #[inline]
    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    /// 获取数据形状大小 (i, j, k).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取数据体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取单个体素分辨率 (header 中的 `pixdim[1..4]`), 以毫米为单位.
    #[inline]
    pub fn pix_dim(&self) -> [f64; 3] {
        let [_, x, y, z, ..] = self.header.pixdim;
        [x as f64, y as f64, z as f64]
    }

    /// 获取体素的实际体积值, 以立方毫米为单位.
    #[inline]
    pub fn voxel(&self) -> f64 {
        self.pix_dim().iter().product()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, T> {
        self.data.view_mut()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_data(self) -> Array3<T> {
        self.data
    }

    /// 获取该体数据的体素轴方向.
    #[inline]
    pub fn orientation(&self) -> SegResult<Orientation> {
        io_orientation(&self.affine)
    }

    /// 对每个体素实施 `f`, 得到同几何信息的新体数据.
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Volume<U> {
        Volume {
            header: self.header.clone(),
            data: self.data.map(f),
            affine: self.affine.clone(),
        }
    }
}

impl<T: Clone> Volume<T> {
    /// 按方向变换 `ornt` 重排体素, 并同步更新仿射矩阵, 使每个体素的物理坐标不变.
    pub fn reorient(&self, ornt: &Orientation) -> Self {
        if ornt.is_canonical() {
            return self.clone();
        }
        let data = ornt.apply(self.data.view());
        let affine = self.affine.dot(&ornt.inv_affine(self.shape()));
        Self::with_header(&self.header, data, affine)
    }

    /// 转换为最接近的 RAS 规范方向.
    ///
    /// 若仿射矩阵退化则返回 `Err`.
    pub fn as_closest_canonical(&self) -> SegResult<Self> {
        let ornt = self.orientation()?;
        Ok(self.reorient(&ornt))
    }

    /// 沿 `axis` 取出 `[start, start + len)` 范围内的体素, 仿射矩阵原点平移到 `start`.
    ///
    /// 范围越界时返回 `Err(SegError::SliceOutOfRange)`.
    pub fn sub_volume(&self, axis: usize, start: usize, len: usize) -> SegResult<Self> {
        if axis > 2 {
            return Err(SegError::InvalidAxis(axis));
        }
        let axis_len = self.data.len_of(Axis(axis));
        if len == 0 || start + len > axis_len {
            return Err(SegError::SliceOutOfRange(start + len, axis_len));
        }
        let mut view = self.data.view();
        view.slice_axis_inplace(Axis(axis), (start..start + len).into());
        let mut origin = [0.0; 3];
        origin[axis] = start as f64;
        let affine = self.affine.translated_to_voxel(origin);
        Ok(Self::with_header(&self.header, view.to_owned(), affine))
    }
}

impl<T: Copy + ToPrimitive> Volume<T> {
    /// 所有体素值之和.
    pub fn sum(&self) -> f64 {
        self.data.iter().filter_map(|v| v.to_f64()).sum()
    }

    /// 非零体素个数.
    pub fn count_nonzero(&self) -> usize {
        self.data
            .iter()
            .filter(|v| v.to_f64().is_some_and(|f| f != 0.0))
            .count()
    }
}

/// 将 nifti 体数组规整为 3D 标准布局. 末尾长度为 1 的维度 (如单帧时间轴) 会被去掉.
fn squeeze_to_3d<T: Clone>(mut data: ndarray::ArrayD<T>, header: &NiftiHeader) -> SegResult<Array3<T>> {
    while data.ndim() > 3 && data.len_of(Axis(data.ndim() - 1)) == 1 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    let found = data.shape().to_vec();
    let [_, x, y, z, ..] = header.dim;
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| SegError::shape_mismatch(&[x as usize, y as usize, z as usize], &found))?;
    Ok(data.as_standard_layout().into_owned())
}

/// nifti 读写. 目前支持 `f32` 和 `u8` 两种体素类型.
macro_rules! impl_volume_io {
    ($($t: ty),+) => {
        $(
            impl Volume<$t> {
                /// 打开 nii 文件格式的 3D 体数据. `path` 为 nii (或 nii.gz) 文件的本地路径.
                /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
                pub fn open<P: AsRef<Path>>(path: P) -> SegResult<Self> {
                    let obj = ReaderOptions::new().read_file(path.as_ref())?;
                    let header = Box::new(obj.header().clone());
                    let affine = Affine::from_header(&header);
                    let data = obj.into_volume().into_ndarray::<$t>()?;
                    let data = squeeze_to_3d(data, &header)?;
                    log::debug!(
                        "opened {} with shape {:?}",
                        path.as_ref().display(),
                        data.dim()
                    );
                    Ok(Self {
                        header,
                        data,
                        affine,
                    })
                }

                /// 以 nii 文件格式保存到 `path`. 仿射矩阵以 sform 形式写入.
                pub fn save<P: AsRef<Path>>(&self, path: P) -> SegResult<()> {
                    let mut header = self.header.as_ref().clone();
                    self.affine.write_into(&mut header);
                    // 数据已经是物理值, 不再缩放.
                    header.scl_slope = 1.0;
                    header.scl_inter = 0.0;
                    WriterOptions::new(path.as_ref())
                        .reference_header(&header)
                        .write_nifti(&self.data)?;
                    log::debug!("saved {}", path.as_ref().display());
                    Ok(())
                }
            }
        )+
    };
}

impl_volume_io!(f32, u8);

#[cfg(test)]
mod tests {
    use super::{ImageVolume, LabelVolume};
    use crate::data::affine::Affine;
    use crate::error::SegError;
    use ndarray::Array3;

    fn lps_affine() -> Affine {
        Affine::from_rows([
            [-0.5, 0.0, 0.0, 40.0],
            [0.0, -0.5, 0.0, 30.0],
            [0.0, 0.0, 2.0, -10.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    fn ramp_volume() -> ImageVolume {
        let data = Array3::from_shape_fn((3, 4, 5), |(i, j, k)| (i * 100 + j * 10 + k) as f32);
        ImageVolume::from_parts(data, lps_affine())
    }

    #[test]
    fn test_geometry_from_parts() {
        let v = ramp_volume();
        assert_eq!(v.shape(), (3, 4, 5));
        assert_eq!(v.pix_dim(), [0.5, 0.5, 2.0]);
        assert_eq!(v.voxel(), 0.5);
        assert_eq!(v.orientation().unwrap().axcodes(), "LPS");
    }

    #[test]
    fn test_as_closest_canonical() {
        let v = ramp_volume();
        let can = v.as_closest_canonical().unwrap();
        assert!(can.orientation().unwrap().is_canonical());
        assert_eq!(can.shape(), (3, 4, 5));
        assert_eq!(can[(0, 0, 0)], v[(2, 3, 0)]);
        assert_eq!(can.sum(), v.sum());

        // 同一体素的物理坐标不变.
        let before = v.affine().apply([2.0, 3.0, 4.0]);
        let after = can.affine().apply([0.0, 0.0, 4.0]);
        assert_eq!(before, after);
    }

    #[test]
    fn test_sub_volume() {
        let v = ramp_volume();
        let sub = v.sub_volume(0, 1, 1).unwrap();
        assert_eq!(sub.shape(), (1, 4, 5));
        assert_eq!(sub[(0, 2, 3)], 123.0);
        assert_eq!(sub.affine().apply([0.0, 0.0, 0.0]), v.affine().apply([1.0, 0.0, 0.0]));

        assert!(matches!(v.sub_volume(0, 3, 1), Err(SegError::SliceOutOfRange(4, 3))));
        assert!(matches!(v.sub_volume(3, 0, 1), Err(SegError::InvalidAxis(3))));
    }

    #[test]
    fn test_label_statistics() {
        let mut data = Array3::<u8>::zeros((2, 2, 2));
        data[(0, 0, 0)] = 3;
        data[(1, 1, 1)] = 1;
        let v = LabelVolume::from_parts(data, Affine::identity());
        assert_eq!(v.sum(), 4.0);
        assert_eq!(v.count_nonzero(), 2);
    }

    #[test]
    fn test_save_open_round_trip() {
        let v = ramp_volume();
        let mut path = std::env::temp_dir();
        path.push(format!("seg_berry_round_trip_{}.nii", std::process::id()));

        v.save(&path).unwrap();
        let back = ImageVolume::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(back.shape(), v.shape());
        assert_eq!(back.data(), v.data());
        assert!(back.affine().approx_eq(v.affine(), 1e-5));
        assert_eq!(back.pix_dim(), v.pix_dim());
    }
}
