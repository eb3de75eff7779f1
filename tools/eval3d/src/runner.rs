//! 程序运行函数.

use std::path::Path;

use anyhow::Context;
use seg_berry::post_proc::threshold_predictions;
use seg_berry::{Evaluation3d, ImageVolume, MetricManager};
use utils::loader;

use crate::result::{EvalResult, SubjectRow};

/// 评估单个受试者. 切片级指标沿第 2 轴 (轴向) 逐层记录进 `manager`.
fn evaluate(pred_path: &Path, gt_path: &Path, thr: f32, manager: &mut MetricManager) -> anyhow::Result<SubjectRow> {
    let pred = ImageVolume::open(pred_path)
        .with_context(|| format!("opening {}", pred_path.display()))?;
    let gt = ImageVolume::open(gt_path).with_context(|| format!("opening {}", gt_path.display()))?;

    let binary = threshold_predictions(pred.data(), thr);
    let pred = ImageVolume::with_header(pred.header(), binary, pred.affine().clone());
    let eval = Evaluation3d::new(pred, gt)?;

    let p = eval.prediction().data().permuted_axes([2, 0, 1]).into_dyn();
    let g = eval.ground_truth().data().permuted_axes([2, 0, 1]).into_dyn();
    manager.record_batch(p, g)?;

    Ok(SubjectRow {
        rvd: eval.relative_volume_difference().ok(),
        avd: eval.absolute_volume_difference().ok(),
        dice: eval.dice()?,
    })
}

/// 实际运行.
pub fn run() -> anyhow::Result<EvalResult> {
    let layout = loader::bids_layout_from_env_or_home()?;
    let pred_dir = loader::pred_dir_from_env(&layout);
    let gt_suffix = loader::gt_suffix_from_env();
    let thr = loader::threshold_from_env()?;
    anyhow::ensure!(pred_dir.is_dir(), "{} is not a directory", pred_dir.display());
    log::info!(
        "predictions = {}, ground truth suffix = {gt_suffix}, threshold = {thr}",
        pred_dir.display()
    );

    let mut manager = MetricManager::new(loader::metrics_from_env()?);
    let mut result = EvalResult::default();
    for sub in layout.subjects()? {
        let pred_path = layout.prediction_path(&pred_dir, &sub);
        if !pred_path.is_file() {
            log::warn!("{sub}: no prediction, skipped");
            continue;
        }
        let gt_path = layout.label_path(&sub, &gt_suffix);
        match evaluate(&pred_path, &gt_path, thr, &mut manager) {
            Ok(row) => {
                log::info!("{sub}: dice = {}", row.dice);
                result.push(sub, row);
            }
            Err(e) => log::warn!("{sub}: {e:#}"),
        }
    }
    result.set_summary(manager.summarize(), manager.num_samples());
    Ok(result)
}
