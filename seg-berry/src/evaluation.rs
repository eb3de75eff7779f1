//! 3D 体积评估: 相对/绝对体积差与整体 Dice.

use std::path::Path;

use crate::data::ImageVolume;
use crate::error::{SegError, SegResult};
use crate::metrics::{dice_score, Measure};

/// 一对 (预测, 真值) 3D 体数据的体积评估.
///
/// 体素间距取自预测. 两者间距不一致时仅记录警告.
#[derive(Debug, Clone)]
pub struct Evaluation3d {
    pred: ImageVolume,
    gt: ImageVolume,
    pix_dim: [f64; 3],
}

impl Evaluation3d {
    /// 形状不一致时返回 `Err(SegError::ShapeMismatch)`.
    pub fn new(pred: ImageVolume, gt: ImageVolume) -> SegResult<Self> {
        if pred.shape() != gt.shape() {
            let (a, b, c) = gt.shape();
            let (x, y, z) = pred.shape();
            return Err(SegError::shape_mismatch(&[a, b, c], &[x, y, z]));
        }
        let pix_dim = pred.pix_dim();
        if pix_dim != gt.pix_dim() {
            log::warn!(
                "voxel spacing differs: prediction {:?}, ground truth {:?}; using the former",
                pix_dim,
                gt.pix_dim()
            );
        }
        Ok(Self { pred, gt, pix_dim })
    }

    /// 从 nii 文件打开预测和真值.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(pred_path: P, gt_path: Q) -> SegResult<Self> {
        Self::new(ImageVolume::open(pred_path)?, ImageVolume::open(gt_path)?)
    }

    /// 预测体数据.
    #[inline]
    pub fn prediction(&self) -> &ImageVolume {
        &self.pred
    }

    /// 真值体数据.
    #[inline]
    pub fn ground_truth(&self) -> &ImageVolume {
        &self.gt
    }

    /// 使用的体素间距 (毫米).
    #[inline]
    pub fn pix_dim(&self) -> [f64; 3] {
        self.pix_dim
    }

    /// `sum(data) * px * py * pz`, 单位为立方毫米.
    pub fn volume(&self, data: &ImageVolume) -> f64 {
        let [px, py, pz] = self.pix_dim;
        data.sum() * px * py * pz
    }

    /// 相对体积差 `(vol_gt - vol_pred) / vol_gt`, 保留符号:
    /// 欠分割为正, 过分割为负.
    ///
    /// # 返回值
    ///
    /// 真值体积为零时返回 `Err(SegError::DivideByZero)`.
    pub fn relative_volume_difference(&self) -> SegResult<f64> {
        let vol_gt = self.volume(&self.gt);
        if vol_gt == 0.0 {
            return Err(SegError::DivideByZero("ground truth volume is empty"));
        }
        let vol_pred = self.volume(&self.pred);
        Ok((vol_gt - vol_pred) / vol_gt)
    }

    /// 绝对体积差, 即相对体积差的绝对值.
    #[inline]
    pub fn absolute_volume_difference(&self) -> SegResult<f64> {
        self.relative_volume_difference().map(f64::abs)
    }

    /// 预测与真值的整体 Dice. 两者都为空时无定义.
    pub fn dice(&self) -> SegResult<Measure> {
        dice_score(self.pred.data(), self.gt.data())
    }
}
