use ndarray::{Array1, Array2, ArrayView2};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{SegError, SegResult};

/// 生成 `k * k` 的归一化高斯核.
///
/// 一维核为 Φ 在 `[-1, 1]` 上 `k + 1` 个等距点处的差分, 二维核为其外积,
/// 再归一化使总和为 1.
///
/// # 注意
///
/// `k` 为 0 时返回 `Err(SegError::EmptyInput)`.
pub fn gaussian_kernel(k: usize) -> SegResult<Array2<f64>> {
    if k == 0 {
        return Err(SegError::EmptyInput("gaussian kernel size must be positive"));
    }
    let normal = Normal::new(0.0, 1.0)?;
    // x_j = (2j - k) / k, 保证 x_{k-j} == -x_j.
    let cdf: Vec<f64> = (0..=k)
        .map(|j| normal.cdf((2.0 * j as f64 - k as f64) / k as f64))
        .collect();
    let k1: Array1<f64> = cdf.windows(2).map(|w| w[1] - w[0]).collect();
    let kern = Array2::from_shape_fn((k, k), |(i, j)| k1[i] * k1[j]);
    let sum = kern.sum();
    Ok(kern / sum)
}

/// 以 `k * k` 高斯核对 `image` 做 "same" 尺寸的零填充卷积, 得到热图.
///
/// 输出形状与 `image` 相同, 相对完整卷积结果的偏移为 `(k - 1) / 2`.
/// `image` 通常只含少量孤立的非零点, 因此只对非零点展开核.
pub fn heatmap_generation(image: ArrayView2<'_, f32>, k: usize) -> SegResult<Array2<f64>> {
    let kern = gaussian_kernel(k)?;
    let (h, w) = image.dim();
    let off = (k - 1) / 2;
    let mut ans = Array2::<f64>::zeros((h, w));
    for ((r, c), &v) in image.indexed_iter() {
        if v == 0.0 {
            continue;
        }
        let v = v as f64;
        for ((ki, kj), &kv) in kern.indexed_iter() {
            // 输出 (r + ki - off, c + kj - off), 越界部分丢弃.
            let (Some(i), Some(j)) = ((r + ki).checked_sub(off), (c + kj).checked_sub(off)) else {
                continue;
            };
            if i < h && j < w {
                ans[(i, j)] += v * kv;
            }
        }
    }
    Ok(ans)
}
