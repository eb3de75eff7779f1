//! 分割指标.
//!
//! - [`scores`]: 二值掩码上的逐样本指标;
//! - [`MetricManager`]: 流式评估中逐批记录, 最后汇总为均值.

mod manager;
mod measure;
pub mod scores;

use ndarray::IxDyn;

pub use manager::{MetricFn, MetricManager, NamedMetric, Summary};
pub use measure::Measure;
pub use scores::{
    accuracy_score, confusion, dice_score, hausdorff_score, intersection_over_union,
    precision_score, recall_score, specificity_score, Confusion,
};

/// 默认的指标列表, 顺序固定:
/// Dice, Hausdorff, 精确率, 召回率, 特异度, 交并比, 准确率.
pub fn default_metrics() -> Vec<NamedMetric> {
    vec![
        NamedMetric::new("dice_score", dice_score::<f32, f32, IxDyn>),
        NamedMetric::new("hausdorff_score", hausdorff_score::<f32, f32, IxDyn>),
        NamedMetric::new("precision_score", precision_score::<f32, f32, IxDyn>),
        NamedMetric::new("recall_score", recall_score::<f32, f32, IxDyn>),
        NamedMetric::new("specificity_score", specificity_score::<f32, f32, IxDyn>),
        NamedMetric::new(
            "intersection_over_union",
            intersection_over_union::<f32, f32, IxDyn>,
        ),
        NamedMetric::new("accuracy_score", accuracy_score::<f32, f32, IxDyn>),
    ]
}
