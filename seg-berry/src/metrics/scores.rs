//! 二值掩码上的逐样本指标.
//!
//! 所有函数都把非零元素视为前景. 结果以 [0, 1] 的比例表示 (Hausdorff 距离除外),
//! 分母为零时返回 [`Measure::Undefined`].

use ndarray::{ArrayView, Dimension, IntoDimension, Zip};
use num::Zero;

use super::Measure;
use crate::error::{SegError, SegResult};

/// 二值分割的混淆矩阵计数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Confusion {
    /// 真阳性.
    pub true_pos: u64,
    /// 假阳性.
    pub false_pos: u64,
    /// 真阴性.
    pub true_neg: u64,
    /// 假阴性.
    pub false_neg: u64,
}

impl Confusion {
    /// 元素总数.
    #[inline]
    pub fn total(&self) -> u64 {
        self.true_pos + self.false_pos + self.true_neg + self.false_neg
    }
}

#[inline]
fn check_shape<A, B, D: Dimension>(a: &ArrayView<A, D>, b: &ArrayView<B, D>) -> SegResult<()> {
    if a.shape() == b.shape() {
        Ok(())
    } else {
        Err(SegError::shape_mismatch(a.shape(), b.shape()))
    }
}

/// 统计 `prediction` 相对于 `ground_truth` 的混淆矩阵.
///
/// 形状不一致时返回 `Err(SegError::ShapeMismatch)`.
pub fn confusion<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Confusion> {
    check_shape(&prediction, &ground_truth)?;
    let mut c = Confusion::default();
    Zip::from(&prediction)
        .and(&ground_truth)
        .for_each(|p, g| match (!p.is_zero(), !g.is_zero()) {
            (true, true) => c.true_pos += 1,
            (true, false) => c.false_pos += 1,
            (false, true) => c.false_neg += 1,
            (false, false) => c.true_neg += 1,
        });
    Ok(c)
}

/// Dice 系数 `2|A ∩ B| / (|A| + |B|)`.
///
/// - 形状不一致时返回 `Err(SegError::ShapeMismatch)`;
/// - 两者都为全背景时返回 `Ok(Measure::Undefined)`.
pub fn dice_score<A: Zero, B: Zero, D: Dimension>(
    im1: ArrayView<'_, A, D>,
    im2: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(im1, im2)?;
    let inter = c.true_pos as f64;
    let sum = (2 * c.true_pos + c.false_pos + c.false_neg) as f64;
    Ok(Measure::ratio(2.0 * inter, sum))
}

/// 精确率 `TP / (TP + FP)`.
pub fn precision_score<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(prediction, ground_truth)?;
    Ok(Measure::ratio(
        c.true_pos as f64,
        (c.true_pos + c.false_pos) as f64,
    ))
}

/// 召回率 `TP / (TP + FN)`.
pub fn recall_score<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(prediction, ground_truth)?;
    Ok(Measure::ratio(
        c.true_pos as f64,
        (c.true_pos + c.false_neg) as f64,
    ))
}

/// 特异度 `TN / (TN + FP)`.
pub fn specificity_score<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(prediction, ground_truth)?;
    Ok(Measure::ratio(
        c.true_neg as f64,
        (c.true_neg + c.false_pos) as f64,
    ))
}

/// 交并比 `TP / (TP + FP + FN)`.
pub fn intersection_over_union<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(prediction, ground_truth)?;
    Ok(Measure::ratio(
        c.true_pos as f64,
        (c.true_pos + c.false_pos + c.false_neg) as f64,
    ))
}

/// 准确率 `(TP + TN) / N`.
pub fn accuracy_score<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    let c = confusion(prediction, ground_truth)?;
    Ok(Measure::ratio(
        (c.true_pos + c.true_neg) as f64,
        c.total() as f64,
    ))
}

/// 前景体素的坐标.
fn foreground<A: Zero, D: Dimension>(a: &ArrayView<'_, A, D>) -> Vec<Vec<f64>> {
    a.indexed_iter()
        .filter(|(_, v)| !v.is_zero())
        .map(|(idx, _)| {
            idx.into_dimension()
                .slice()
                .iter()
                .map(|&i| i as f64)
                .collect()
        })
        .collect()
}

/// 有向 Hausdorff 距离 `max_{p ∈ from} min_{q ∈ to} |p - q|`.
fn directed_hausdorff(from: &[Vec<f64>], to: &[Vec<f64>]) -> f64 {
    from.iter()
        .map(|p| {
            to.iter()
                .map(|q| {
                    p.iter()
                        .zip(q.iter())
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum::<f64>()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .fold(0.0, f64::max)
        .sqrt()
}

/// 对称 Hausdorff 距离, 以体素为单位.
///
/// 任一掩码为全背景时返回 `Ok(Measure::Undefined)`. 该实现为暴力算法,
/// 复杂度为两前景体素数之积, 适合二维切片.
pub fn hausdorff_score<A: Zero, B: Zero, D: Dimension>(
    prediction: ArrayView<'_, A, D>,
    ground_truth: ArrayView<'_, B, D>,
) -> SegResult<Measure> {
    check_shape(&prediction, &ground_truth)?;
    let p = foreground(&prediction);
    let g = foreground(&ground_truth);
    if p.is_empty() || g.is_empty() {
        return Ok(Measure::Undefined);
    }
    let d = directed_hausdorff(&p, &g).max(directed_hausdorff(&g, &p));
    Ok(Measure::Defined(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array2};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_dice_identity_and_symmetry() {
        let a = arr2(&[[1u8, 1, 0], [0, 1, 0]]);
        let b = arr2(&[[0u8, 1, 1], [0, 1, 0]]);
        assert_eq!(dice_score(a.view(), a.view()).unwrap(), Measure::Defined(1.0));
        let ab = dice_score(a.view(), b.view()).unwrap();
        let ba = dice_score(b.view(), a.view()).unwrap();
        assert_eq!(ab, ba);
        // |A ∩ B| = 2, |A| + |B| = 6.
        assert!(f64_eq(ab.value().unwrap(), 2.0 / 3.0));
    }

    #[test]
    fn test_dice_empty_and_shape() {
        let e = Array2::<f32>::zeros((2, 2));
        assert_eq!(dice_score(e.view(), e.view()).unwrap(), Measure::Undefined);

        let a = arr2(&[[1.0f32, 0.0]]);
        let b = arr2(&[[0.0f32, 1.0]]);
        assert_eq!(dice_score(a.view(), b.view()).unwrap(), Measure::Defined(0.0));

        let c = Array2::<f32>::zeros((1, 3));
        assert!(matches!(
            dice_score(a.view(), c.view()),
            Err(SegError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_dice_mixed_element_types() {
        let pred = arr1(&[0.0f32, 1.0, 1.0, 0.0]);
        let gt = arr1(&[0u8, 2, 0, 0]);
        assert!(f64_eq(
            dice_score(pred.view(), gt.view()).unwrap().value().unwrap(),
            2.0 / 3.0
        ));
    }

    #[test]
    fn test_confusion_based_scores() {
        // TP = 2, FP = 1, FN = 1, TN = 4.
        let pred = arr1(&[1u8, 1, 1, 0, 0, 0, 0, 0]);
        let gt = arr1(&[1u8, 1, 0, 1, 0, 0, 0, 0]);
        let c = confusion(pred.view(), gt.view()).unwrap();
        assert_eq!(
            c,
            Confusion {
                true_pos: 2,
                false_pos: 1,
                true_neg: 4,
                false_neg: 1
            }
        );

        let v = |m: SegResult<Measure>| m.unwrap().value().unwrap();
        assert!(f64_eq(v(precision_score(pred.view(), gt.view())), 2.0 / 3.0));
        assert!(f64_eq(v(recall_score(pred.view(), gt.view())), 2.0 / 3.0));
        assert!(f64_eq(v(specificity_score(pred.view(), gt.view())), 0.8));
        assert!(f64_eq(v(intersection_over_union(pred.view(), gt.view())), 0.5));
        assert!(f64_eq(v(accuracy_score(pred.view(), gt.view())), 0.75));
    }

    #[test]
    fn test_empty_prediction_is_undefined_precision() {
        let pred = arr1(&[0u8, 0, 0]);
        let gt = arr1(&[1u8, 0, 0]);
        assert_eq!(
            precision_score(pred.view(), gt.view()).unwrap(),
            Measure::Undefined
        );
        assert_eq!(
            recall_score(pred.view(), gt.view()).unwrap(),
            Measure::Defined(0.0)
        );
    }

    #[test]
    fn test_hausdorff() {
        let a = arr2(&[[1u8, 0, 0, 0], [0, 0, 0, 0]]);
        let b = arr2(&[[1u8, 0, 0, 1], [0, 0, 0, 0]]);
        // a -> b: 0; b -> a: 3.
        assert_eq!(hausdorff_score(a.view(), b.view()).unwrap(), Measure::Defined(3.0));
        assert_eq!(hausdorff_score(b.view(), a.view()).unwrap(), Measure::Defined(3.0));
        assert_eq!(hausdorff_score(a.view(), a.view()).unwrap(), Measure::Defined(0.0));

        let e = Array2::<u8>::zeros((2, 4));
        assert_eq!(hausdorff_score(a.view(), e.view()).unwrap(), Measure::Undefined);
    }
}
