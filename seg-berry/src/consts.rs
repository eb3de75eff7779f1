//! 通用常量.

/// 椎间盘标注 (disc labeling) 的标签值.
pub mod disc {
    /// 背景体素值.
    pub const BACKGROUND: u8 = 0;

    /// C1/C2 标签. 人工标注时难以区分, 提取全部标签时跳过.
    pub const C1_C2: u8 = 1;

    /// 脑桥延髓交界 (PMJ) 标签, 不属于椎间盘.
    pub const PMJ: u8 = 49;

    /// 椎间盘标签的上界 (不含).
    pub const DISC_UPPER: u8 = 30;

    /// 体素是否是参与热图的椎间盘标签?
    ///
    /// 即非零、小于 [`DISC_UPPER`], 且不是 [`C1_C2`] 或 [`PMJ`].
    #[inline]
    pub const fn is_disc(p: u8) -> bool {
        p != BACKGROUND && p < DISC_UPPER && p != C1_C2 && p != PMJ
    }
}

/// 默认的高斯核大小.
pub const DEFAULT_KERNEL_SIZE: usize = 10;

/// 默认的预测二值化阈值.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// BIDS 数据集中派生数据所在目录名.
pub const BIDS_DERIVATIVES: &str = "derivatives";

/// 椎间盘人工标注文件名后缀.
pub const DISC_LABEL_SUFFIX: &str = "_label-disc-manual";
