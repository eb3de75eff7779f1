//! 评估 BIDS 数据集上的 3D 分割预测.
//!
//! 配置见 `utils::loader`: `$BIDS_DIR`, `$BIDS_SUFFIX`, `$SEG_PRED_DIR`,
//! `$SEG_GT_SUFFIX`, `$SEG_THRESHOLD`, `$SEG_HAUSDORFF`.
//!
//! Hausdorff 距离是逐对暴力计算的, 默认不启用; 设置 `SEG_HAUSDORFF=true` 后
//! 才会出现在切片级指标中.

mod result;
mod runner;

fn main() -> anyhow::Result<()> {
    utils::init_logger()?;
    let result = runner::run()?;
    result.analyze()?;
    Ok(())
}
