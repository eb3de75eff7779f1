//! BIDS 目录布局下的文件路径, 以及迭代器风格的样本加载器.
//!
//! ```text
//! <root>/<sub>/anat/<sub><suffix>.nii.gz                                   影像
//! <root>/<sub>/anat/<sub><suffix>_mid.nii.gz                               正中矢状面影像
//! <root>/derivatives/labels/<sub>/anat/<sub><suffix>_label-disc-manual.nii.gz  椎间盘标注
//! <root>/derivatives/labels/<sub>/anat/<sub><suffix>_mid_heatmap<aim>.nii.gz   热图
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::consts::{BIDS_DERIVATIVES, DISC_LABEL_SUFFIX};
use crate::data::{ImageVolume, LabelVolume};
use crate::error::SegResult;
use crate::heatmap::LabelAim;

const NII_GZ: &str = ".nii.gz";

/// 一个 BIDS 数据集的根目录和影像后缀 (如 `_T2w`).
#[derive(Debug, Clone)]
pub struct BidsLayout {
    root: PathBuf,
    suffix: String,
}

impl BidsLayout {
    /// 以根目录 `root` 和影像后缀 `suffix` 创建.
    pub fn new<P: AsRef<Path>, S: Into<String>>(root: P, suffix: S) -> Self {
        Self {
            root: root.as_ref().to_owned(),
            suffix: suffix.into(),
        }
    }

    /// 数据集根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 影像后缀.
    #[inline]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// 根目录下所有受试者目录名 (跳过 `derivatives`), 按字典序排列.
    pub fn subjects(&self) -> io::Result<Vec<String>> {
        let mut ans = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name != BIDS_DERIVATIVES {
                ans.push(name);
            }
        }
        ans.sort();
        Ok(ans)
    }

    fn anat_file(&self, dir: PathBuf, sub: &str, tail: &str) -> PathBuf {
        let mut ans = dir;
        ans.push(sub);
        ans.push("anat");
        ans.push(format!("{sub}{}{tail}{NII_GZ}", self.suffix));
        ans
    }

    fn labels_dir(&self) -> PathBuf {
        let mut ans = self.root.join(BIDS_DERIVATIVES);
        ans.push("labels");
        ans
    }

    /// 受试者影像路径.
    pub fn image_path(&self, sub: &str) -> PathBuf {
        self.anat_file(self.root.clone(), sub, "")
    }

    /// 正中矢状面影像的输出路径.
    pub fn mid_image_path(&self, sub: &str) -> PathBuf {
        self.anat_file(self.root.clone(), sub, "_mid")
    }

    /// 椎间盘人工标注路径.
    pub fn disc_label_path(&self, sub: &str) -> PathBuf {
        self.anat_file(self.labels_dir(), sub, DISC_LABEL_SUFFIX)
    }

    /// 椎间盘热图的输出路径. `aim` 以 `-1` 或标签值的形式出现在文件名中.
    pub fn heatmap_path(&self, sub: &str, aim: LabelAim) -> PathBuf {
        self.anat_file(self.labels_dir(), sub, &format!("_mid_heatmap{aim}"))
    }

    /// 后缀为 `label_suffix` 的人工标注路径 (如 `_seg-manual`).
    pub fn label_path(&self, sub: &str, label_suffix: &str) -> PathBuf {
        self.anat_file(self.labels_dir(), sub, label_suffix)
    }

    /// 预测目录 `pred_dir` 下该受试者的预测文件路径.
    pub fn prediction_path<P: AsRef<Path>>(&self, pred_dir: P, sub: &str) -> PathBuf {
        pred_dir
            .as_ref()
            .join(format!("{sub}{}_pred{NII_GZ}", self.suffix))
    }

    /// 创建椎间盘样本加载器. 只包含影像文件存在的受试者.
    pub fn disc_loader(&self) -> io::Result<DiscLoader> {
        let mut data_rev: Vec<String> = self
            .subjects()?
            .into_iter()
            .filter(|sub| {
                let found = self.image_path(sub).is_file();
                if !found {
                    log::warn!("{sub}: image not found, skipped");
                }
                found
            })
            .collect();
        data_rev.reverse();
        Ok(DiscLoader {
            layout: self.clone(),
            data_rev,
        })
    }
}

/// 椎间盘样本: 受试者的影像及其椎间盘标注.
#[derive(Debug, Clone)]
pub struct DiscSample {
    /// 影像.
    pub image: ImageVolume,
    /// 椎间盘标注.
    pub label: LabelVolume,
}

/// 按受试者名顺序加载 [`DiscSample`].
#[derive(Debug)]
pub struct DiscLoader {
    layout: BidsLayout,
    data_rev: Vec<String>,
}

impl Iterator for DiscLoader {
    type Item = (String, SegResult<DiscSample>);

    fn next(&mut self) -> Option<Self::Item> {
        let sub = self.data_rev.pop()?;
        let sample = ImageVolume::open(self.layout.image_path(&sub)).and_then(|image| {
            let label = LabelVolume::open(self.layout.disc_label_path(&sub))?;
            Ok(DiscSample { image, label })
        });
        Some((sub, sample))
    }
}

impl ExactSizeIterator for DiscLoader {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}
