//! 由逐切片预测重建 3D 体数据, 并还原到参考影像的原始方向.
//!
//! 推理通常在 RAS 规范方向的体数据上逐切片进行. 重建分为两步:
//!
//! 1. 将切片按索引堆叠, 缺失的索引以全零切片填充, 得到 RAS 规范方向的 3D 数组;
//! 2. 计算从规范方向到参考影像原始方向的变换并实施.

use std::path::Path;

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::data::{io_orientation, Affine, ImageVolume, Orientation, SlicePredictions, Volume};
use crate::error::{SegError, SegResult};
use crate::Idx2d;

/// 检查所有切片形状一致, 并返回该形状.
fn uniform_slice_shape(preds: &SlicePredictions) -> SegResult<Idx2d> {
    let mut it = preds.iter();
    let (_, first) = it
        .next()
        .ok_or(SegError::EmptyInput("no predictions to reconstruct"))?;
    let shape = first.dim();
    for (_, s) in it {
        if s.dim() != shape {
            return Err(SegError::shape_mismatch(first.shape(), s.shape()));
        }
    }
    Ok(shape)
}

/// 从规范方向 (`canonical` 所描述) 到原始方向 (`native` 所描述) 的变换.
fn canonical_to_native(canonical: &Affine, native: &Affine) -> SegResult<Orientation> {
    Ok(io_orientation(canonical)?.transform_to(&io_orientation(native)?))
}

/// 将 `preds` 重建为 `native_affine` 所描述方向上的 3D 数组.
///
/// `canonical_affine` 为切片所在 (规范方向) 体数据的仿射矩阵, `native_affine`
/// 为参考影像重定向之前的仿射矩阵.
///
/// # 返回值
///
/// - 没有任何切片时, 返回 `Err(SegError::EmptyInput)`;
/// - 切片之间形状不一致, 或堆叠结果与 `preds.shape()` 不符时, 返回 `Err(SegError::ShapeMismatch)`;
/// - 任一仿射矩阵退化时, 返回 `Err(SegError::DegenerateAffine)`.
pub fn reconstruct(
    preds: &SlicePredictions,
    canonical_affine: &Affine,
    native_affine: &Affine,
) -> SegResult<Array3<f32>> {
    let axis = preds.axis().index();
    let slice_shape = uniform_slice_shape(preds)?;

    let zeros = Array2::<f32>::zeros(slice_shape);
    let views: Vec<ArrayView2<f32>> = (0..preds.axis_len())
        .map(|i| preds.get(i).map_or(zeros.view(), |s| s.view()))
        .collect();
    log::debug!(
        "reconstructing {} {} slices ({} given) of shape {:?}",
        views.len(),
        preds.axis(),
        preds.len(),
        slice_shape
    );

    let mut arr = ndarray::stack(Axis(0), &views).map_err(|_| {
        SegError::shape_mismatch(&[slice_shape.0, slice_shape.1], &[])
    })?;
    // 轴向切片以 (i, j) 存储, 堆叠后为 (k, i, j).
    if axis == 2 {
        arr.swap_axes(1, 2);
    }
    arr.swap_axes(0, axis);

    let (x, y, z) = preds.shape();
    if arr.dim() != (x, y, z) {
        return Err(SegError::shape_mismatch(&[x, y, z], arr.shape()));
    }

    let transform = canonical_to_native(canonical_affine, native_affine)?;
    Ok(transform.apply(arr.view()))
}

/// 与 [`reconstruct`] 相同, 但返回带有原始方向仿射矩阵的体数据.
///
/// `canonical_ref` 为切片所在的规范方向体数据, 其形状必须与 `preds.shape()` 一致.
/// 返回值的 header 以 `canonical_ref` 为模板.
pub fn reconstruct_volume<T>(
    preds: &SlicePredictions,
    canonical_ref: &Volume<T>,
    native_affine: &Affine,
) -> SegResult<ImageVolume> {
    let (x, y, z) = canonical_ref.shape();
    let (px, py, pz) = preds.shape();
    if (x, y, z) != (px, py, pz) {
        return Err(SegError::shape_mismatch(&[x, y, z], &[px, py, pz]));
    }
    let data = reconstruct(preds, canonical_ref.affine(), native_affine)?;
    let transform = canonical_to_native(canonical_ref.affine(), native_affine)?;
    let affine = canonical_ref
        .affine()
        .dot(&transform.inv_affine(canonical_ref.shape()));
    Ok(Volume::with_header(canonical_ref.header(), data, affine))
}

/// 以参考影像 `reference` (原始方向) 为准重建 `preds`.
///
/// `preds` 的切片应取自 `reference.as_closest_canonical()`. 返回值与 `reference`
/// 形状、方向、仿射矩阵完全一致, 可以直接与之对照.
pub fn reconstruct_like<T: Clone>(
    preds: &SlicePredictions,
    reference: &Volume<T>,
) -> SegResult<ImageVolume> {
    let canonical = reference.as_closest_canonical()?;
    let data = reconstruct_volume(preds, &canonical, reference.affine())?.into_data();
    debug_assert_eq!(data.dim(), reference.shape());
    Ok(Volume::with_header(
        reference.header(),
        data,
        reference.affine().clone(),
    ))
}

/// 重建 `preds` 并保存为 nii 文件. 参见 [`reconstruct_like`].
pub fn save_prediction<T: Clone, P: AsRef<Path>>(
    preds: &SlicePredictions,
    reference: &Volume<T>,
    path: P,
) -> SegResult<()> {
    reconstruct_like(preds, reference)?.save(path)
}

#[cfg(test)]
mod tests {
    use super::{reconstruct, reconstruct_like};
    use crate::data::{Affine, ImageVolume, SliceAxis, SlicePredictions};
    use crate::error::SegError;
    use ndarray::{Array2, Array3, Axis};

    fn ramp(shape: (usize, usize, usize)) -> Array3<f32> {
        Array3::from_shape_fn(shape, |(i, j, k)| (i * 100 + j * 10 + k) as f32 + 1.0)
    }

    fn full_set(arr: &Array3<f32>, axis: SliceAxis) -> SlicePredictions {
        SlicePredictions::from_iter(
            axis,
            arr.dim(),
            arr.axis_iter(Axis(axis.index()))
                .map(|s| s.to_owned())
                .enumerate(),
        )
        .unwrap()
    }

    #[test]
    fn test_full_set_is_lossless_on_every_axis() {
        let arr = ramp((2, 3, 4));
        let id = Affine::identity();
        for axis in [SliceAxis::Sagittal, SliceAxis::Coronal, SliceAxis::Axial] {
            let preds = full_set(&arr, axis);
            let out = reconstruct(&preds, &id, &id).unwrap();
            assert_eq!(out, arr, "axis {axis}");
            assert_eq!(out.sum(), arr.sum());
        }
    }

    #[test]
    fn test_missing_slices_are_zero_filled() {
        let arr = ramp((2, 3, 4));
        let mut preds = SlicePredictions::new(SliceAxis::Axial, arr.dim());
        for k in [0, 2] {
            preds
                .insert(k, arr.index_axis(Axis(2), k).to_owned())
                .unwrap();
        }
        let id = Affine::identity();
        let out = reconstruct(&preds, &id, &id).unwrap();
        assert_eq!(out.dim(), (2, 3, 4));
        for k in [1, 3] {
            assert!(out.index_axis(Axis(2), k).iter().all(|v| *v == 0.0));
        }
        for k in [0, 2] {
            assert_eq!(out.index_axis(Axis(2), k), arr.index_axis(Axis(2), k));
        }
    }

    #[test]
    fn test_reconstruct_errors() {
        let id = Affine::identity();
        let preds = SlicePredictions::new(SliceAxis::Sagittal, (2, 3, 4));
        assert!(matches!(
            reconstruct(&preds, &id, &id),
            Err(SegError::EmptyInput(_))
        ));

        let preds = SlicePredictions::from_iter(
            SliceAxis::Sagittal,
            (2, 3, 4),
            [(0, Array2::zeros((3, 4))), (1, Array2::zeros((4, 3)))],
        )
        .unwrap();
        assert!(matches!(
            reconstruct(&preds, &id, &id),
            Err(SegError::ShapeMismatch { .. })
        ));

        // 切片形状与目标形状不符.
        let preds = SlicePredictions::from_iter(
            SliceAxis::Sagittal,
            (2, 3, 4),
            [(0, Array2::zeros((4, 4)))],
        )
        .unwrap();
        assert!(matches!(
            reconstruct(&preds, &id, &id),
            Err(SegError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_reconstruct_back_to_native_orientation() {
        // 原始方向为 "PLS" 的参考影像: i -> -y, j -> -x.
        let native = ImageVolume::from_parts(
            ramp((3, 4, 5)),
            Affine::from_rows([
                [0.0, -1.0, 0.0, 3.0],
                [-2.0, 0.0, 0.0, 8.0],
                [0.0, 0.0, 1.5, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ]),
        );
        assert_eq!(native.orientation().unwrap().axcodes(), "PLS");

        let canonical = native.as_closest_canonical().unwrap();
        assert_eq!(canonical.shape(), (4, 3, 5));

        let can_data = canonical.data().to_owned();
        for axis in [SliceAxis::Sagittal, SliceAxis::Coronal, SliceAxis::Axial] {
            let preds = full_set(&can_data, axis);
            let out = reconstruct_like(&preds, &native).unwrap();
            assert_eq!(out.data(), native.data());
            assert_eq!(out.affine(), native.affine());

            let data = reconstruct(&preds, canonical.affine(), native.affine()).unwrap();
            assert_eq!(data.view(), native.data());
        }
    }

    #[test]
    fn test_reconstruct_volume_keeps_world_coordinates() {
        let native = ImageVolume::from_parts(ramp((3, 4, 5)), Affine::from_diagonal([-1.0, 1.0, -2.0]));
        let canonical = native.as_closest_canonical().unwrap();
        let preds = full_set(&canonical.data().to_owned(), SliceAxis::Coronal);
        let out = super::reconstruct_volume(&preds, &canonical, native.affine()).unwrap();
        assert!(out.affine().approx_eq(native.affine(), 1e-9));
    }
}
