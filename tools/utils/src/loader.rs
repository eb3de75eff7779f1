//! 从环境变量读取工具程序的配置. 未设置时回落到用户主目录下的默认值.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use seg_berry::consts::{BIDS_DERIVATIVES, DEFAULT_KERNEL_SIZE, DEFAULT_THRESHOLD};
use seg_berry::dataset::{home_dataset_dir_with, BidsLayout};
use seg_berry::heatmap::LabelAim;
use seg_berry::metrics::{default_metrics, NamedMetric};

/// 读取环境变量 `key` 并解析. 未设置时返回 `default`.
fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(s) => s
            .trim()
            .parse()
            .with_context(|| format!("invalid ${key}: `{s}`")),
        Err(_) => Ok(default),
    }
}

/// 获取 BIDS 数据集根目录.
///
/// 1. 若环境变量 `$BIDS_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/bids`.
pub fn bids_dir_from_env_or_home() -> anyhow::Result<PathBuf> {
    if let Ok(d) = env::var("BIDS_DIR") {
        Ok(PathBuf::from(d))
    } else {
        home_dataset_dir_with(["bids"]).context("cannot locate home directory")
    }
}

/// 影像后缀, `$BIDS_SUFFIX`, 默认为 `_T2w`.
pub fn suffix_from_env() -> String {
    env::var("BIDS_SUFFIX").unwrap_or_else(|_| "_T2w".to_string())
}

/// 由 `$BIDS_DIR` 和 `$BIDS_SUFFIX` 创建数据集布局. 根目录必须存在.
pub fn bids_layout_from_env_or_home() -> anyhow::Result<BidsLayout> {
    let root = bids_dir_from_env_or_home()?;
    anyhow::ensure!(root.is_dir(), "{} is not a directory", root.display());
    Ok(BidsLayout::new(root, suffix_from_env()))
}

/// 椎间盘标签选择, `$DISC_AIM`, 默认为 `-1` (全部).
pub fn disc_aim_from_env() -> anyhow::Result<LabelAim> {
    let aim: i32 = parse_env("DISC_AIM", -1)?;
    Ok(LabelAim::try_from(aim)?)
}

/// 高斯核大小, `$HEATMAP_KERNEL`.
pub fn kernel_from_env() -> anyhow::Result<usize> {
    parse_env("HEATMAP_KERNEL", DEFAULT_KERNEL_SIZE)
}

/// 预测文件目录.
///
/// 1. 若环境变量 `$SEG_PRED_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `<BIDS 根目录>/derivatives/predictions`.
pub fn pred_dir_from_env(layout: &BidsLayout) -> PathBuf {
    if let Ok(d) = env::var("SEG_PRED_DIR") {
        PathBuf::from(d)
    } else {
        layout.root().join(BIDS_DERIVATIVES).join("predictions")
    }
}

/// 分割真值后缀, `$SEG_GT_SUFFIX`, 默认为 `_seg-manual`.
pub fn gt_suffix_from_env() -> String {
    env::var("SEG_GT_SUFFIX").unwrap_or_else(|_| "_seg-manual".to_string())
}

/// 预测二值化阈值, `$SEG_THRESHOLD`.
pub fn threshold_from_env() -> anyhow::Result<f32> {
    parse_env("SEG_THRESHOLD", DEFAULT_THRESHOLD)
}

/// `eval3d` 的切片级指标.
///
/// Hausdorff 距离逐对暴力计算, 每个切片的代价为 O(|P|·|G|), 前景较大时很慢.
/// 因此只有 `$SEG_HAUSDORFF` 为 `true` 时才启用, 默认关闭.
pub fn metrics_from_env() -> anyhow::Result<Vec<NamedMetric>> {
    Ok(select_metrics(parse_env("SEG_HAUSDORFF", false)?))
}

fn select_metrics(hausdorff: bool) -> Vec<NamedMetric> {
    default_metrics()
        .into_iter()
        .filter(|m| hausdorff || m.name() != "hausdorff_score")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::select_metrics;

    #[test]
    fn test_hausdorff_is_opt_in() {
        let names = |v: Vec<seg_berry::metrics::NamedMetric>| -> Vec<&'static str> {
            v.iter().map(|m| m.name()).collect()
        };
        let off = names(select_metrics(false));
        assert_eq!(off.len(), 6);
        assert!(!off.contains(&"hausdorff_score"));
        assert_eq!(off[0], "dice_score");

        let on = names(select_metrics(true));
        assert_eq!(on.len(), 7);
        assert_eq!(on[1], "hausdorff_score");
    }
}
