//! 椎间盘定位数据集的准备: 正中矢状面影像与椎间盘热图.

use ndarray::{Array2, Axis};

use super::kernel::heatmap_generation;
use super::points::{extract_points_from_array, LabelAim, PointLabel};
use crate::data::{Affine, ImageVolume, LabelVolume, SliceAxis, SlicePredictions, Volume};
use crate::error::{SegError, SegResult};
use crate::recon::reconstruct_volume;

/// 在规范方向体数据 `canonical` 上, 沿 `axis` 取第 `index` 层及其两侧各一层的平均.
///
/// 结果为该轴上只有一层的体数据, 仿射矩阵原点平移到第 `index` 层.
/// 两侧的层在越过边界时被截断.
///
/// # 返回值
///
/// `index` 越界时返回 `Err(SegError::SliceOutOfRange)`.
pub fn mid_slice_average(canonical: &ImageVolume, index: usize, axis: SliceAxis) -> SegResult<ImageVolume> {
    let a = axis.index();
    let len = canonical.data().len_of(Axis(a));
    if index >= len {
        return Err(SegError::SliceOutOfRange(index, len));
    }
    let lo = index.saturating_sub(1);
    let hi = (index + 2).min(len);
    let mean = canonical
        .data()
        .slice_axis(Axis(a), (lo..hi).into())
        .mean_axis(Axis(a))
        .ok_or(SegError::EmptyInput("no slice to average"))?
        .insert_axis(Axis(a));

    let mut origin = [0.0; 3];
    origin[a] = index as f64;
    let affine = canonical.affine().translated_to_voxel(origin);
    Ok(Volume::with_header(canonical.header(), mean, affine))
}

/// 将沿第 0 轴只有一层的规范方向体数据 `plane` 还原到 `native_affine` 所描述的方向.
fn plane_to_native<T>(
    plane: Array2<f32>,
    canonical_ref: &Volume<T>,
    native_affine: &Affine,
) -> SegResult<ImageVolume> {
    let preds = SlicePredictions::from_iter(SliceAxis::Sagittal, canonical_ref.shape(), [(0, plane)])?;
    reconstruct_volume(&preds, canonical_ref, native_affine)
}

/// 影像 `image` 在矢状面第 `x` 层 (规范方向下) 处的三层平均, 以原始方向返回.
pub fn mid_sagittal_image(image: &ImageVolume, x: usize) -> SegResult<ImageVolume> {
    let canonical = image.as_closest_canonical()?;
    let mid = mid_slice_average(&canonical, x, SliceAxis::Sagittal)?;
    let plane = mid.data().index_axis(Axis(0), 0).to_owned();
    plane_to_native(plane, &mid, image.affine())
}

/// 由标注点生成单层矢状面热图 (规范方向).
///
/// 所有点都被投影到 (y, z) 平面上, 再以 `kernel` 大小的高斯核卷积.
/// `plane_shape` 为规范方向下 (y, z) 两轴的长度. 某个点落在平面外时返回
/// `Err(SegError::ShapeMismatch)`, 其中 `found` 为该点的 `[y, z]`.
pub fn points_heatmap(points: &[PointLabel], plane_shape: (usize, usize), kernel: usize) -> SegResult<Array2<f32>> {
    let mut plane = Array2::<f32>::zeros(plane_shape);
    for p in points {
        let cell = plane
            .get_mut((p.y, p.z))
            .ok_or_else(|| SegError::shape_mismatch(&[plane_shape.0, plane_shape.1], &[p.y, p.z]))?;
        *cell = 1.0;
    }
    Ok(heatmap_generation(plane.view(), kernel)?.mapv(|v| v as f32))
}

/// 椎间盘热图及其所在的矢状面.
#[derive(Debug, Clone)]
pub struct DiscHeatmap {
    /// 提取出的标注点, 按标签值升序.
    pub points: Vec<PointLabel>,
    /// 热图所在的矢状面 (规范方向下的第 0 轴索引), 即第一个点的 `x`.
    pub sagittal_index: usize,
    /// 原始方向的单层热图.
    pub heatmap: ImageVolume,
}

/// 从椎间盘标注 `label` 生成热图.
///
/// 1. 转换到规范方向并按 `aim` 提取标注点;
/// 2. 以第一个点的 `x` 为矢状面, 将所有点投影到该面并做高斯卷积;
/// 3. 将单层热图还原到 `label` 的原始方向.
///
/// # 返回值
///
/// 没有任何被选中的标注点时返回 `Err(SegError::EmptyInput)`.
pub fn disc_heatmap(label: &LabelVolume, aim: LabelAim, kernel: usize) -> SegResult<DiscHeatmap> {
    let canonical = label.as_closest_canonical()?;
    let points = extract_points_from_array(canonical.data(), aim);
    let first = points
        .first()
        .ok_or(SegError::EmptyInput("no disc label selected"))?;
    let sagittal_index = first.x;
    let (_, y, z) = canonical.shape();
    log::debug!(
        "{} disc points, heatmap on sagittal slice {sagittal_index}",
        points.len()
    );

    let plane = points_heatmap(&points, (y, z), kernel)?;
    let reference = canonical.sub_volume(0, sagittal_index, 1)?;
    let heatmap = plane_to_native(plane, &reference, label.affine())?;
    Ok(DiscHeatmap {
        points,
        sagittal_index,
        heatmap,
    })
}
