//! 为 BIDS 数据集的每个受试者生成正中矢状面影像和椎间盘热图.
//!
//! 配置见 `utils::loader`: `$BIDS_DIR`, `$BIDS_SUFFIX`, `$DISC_AIM`, `$HEATMAP_KERNEL`.

mod runner;

fn main() -> anyhow::Result<()> {
    utils::init_logger()?;
    let report = runner::run()?;
    report.analyze();
    Ok(())
}
