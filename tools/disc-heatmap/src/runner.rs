//! 程序运行函数.

use anyhow::Context;
use seg_berry::dataset::{BidsLayout, DiscSample};
use seg_berry::heatmap::{self, LabelAim};
use utils::loader;

/// 运行统计.
#[derive(Debug, Default)]
pub struct Report {
    done: Vec<(String, usize)>,
    failed: Vec<(String, String)>,
}

impl Report {
    /// 输出运行统计.
    pub fn analyze(&self) {
        utils::sep();
        println!("Processed subjects: {}", self.done.len());
        for (sub, n) in self.done.iter() {
            println!("    {sub}: {n} points");
        }
        println!("Failed subjects: {}", self.failed.len());
        for (sub, e) in self.failed.iter() {
            println!("    {sub}: {e}");
        }
        utils::sep();
    }
}

/// 处理单个受试者, 返回标注点个数.
fn process(layout: &BidsLayout, sub: &str, sample: &DiscSample, aim: LabelAim, kernel: usize) -> anyhow::Result<usize> {
    let disc = heatmap::disc_heatmap(&sample.label, aim, kernel)?;
    let mid = heatmap::mid_sagittal_image(&sample.image, disc.sagittal_index)
        .context("extracting mid-sagittal slice")?;

    let mid_path = layout.mid_image_path(sub);
    mid.save(&mid_path)
        .with_context(|| format!("saving {}", mid_path.display()))?;
    let heat_path = layout.heatmap_path(sub, aim);
    disc.heatmap
        .save(&heat_path)
        .with_context(|| format!("saving {}", heat_path.display()))?;
    Ok(disc.points.len())
}

/// 实际运行.
pub fn run() -> anyhow::Result<Report> {
    let layout = loader::bids_layout_from_env_or_home()?;
    let aim = loader::disc_aim_from_env()?;
    let kernel = loader::kernel_from_env()?;
    log::info!(
        "bids = {}, suffix = {}, aim = {aim}, kernel = {kernel}",
        layout.root().display(),
        layout.suffix()
    );

    let mut report = Report::default();
    for (sub, sample) in layout.disc_loader()? {
        let res = sample
            .map_err(anyhow::Error::from)
            .and_then(|s| process(&layout, &sub, &s, aim, kernel));
        match res {
            Ok(n) => {
                log::info!("{sub}: {n} points");
                report.done.push((sub, n));
            }
            Err(e) => {
                log::warn!("{sub}: {e:#}");
                report.failed.push((sub, format!("{e:#}")));
            }
        }
    }
    Ok(report)
}
