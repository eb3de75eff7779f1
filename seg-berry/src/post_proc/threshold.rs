use ndarray::{Array, ArrayView, Dimension};

#[inline]
fn binarize(v: f32, thr: f32) -> f32 {
    if v.is_nan() {
        v
    } else if v < thr {
        0.0
    } else {
        1.0
    }
}

/// 以 `thr` 二值化预测概率: 小于 `thr` 置 0, 不小于 `thr` 置 1. NaN 保持不变.
pub fn threshold_predictions<D: Dimension>(predictions: ArrayView<'_, f32, D>, thr: f32) -> Array<f32, D> {
    predictions.mapv(|v| binarize(v, thr))
}

/// 原地二值化. 参见 [`threshold_predictions`].
pub fn threshold_predictions_inplace<D: Dimension>(predictions: &mut Array<f32, D>, thr: f32) {
    predictions.mapv_inplace(|v| binarize(v, thr));
}
