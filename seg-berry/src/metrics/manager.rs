use std::fmt;

use ndarray::{ArrayViewD, Axis};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::Measure;
use crate::error::{SegError, SegResult};

/// 逐样本指标函数: 接受 (预测, 真值), 返回一个指标值.
pub type MetricFn = fn(ArrayViewD<'_, f32>, ArrayViewD<'_, f32>) -> SegResult<Measure>;

/// 带名字的指标函数.
#[derive(Copy, Clone, Debug)]
pub struct NamedMetric {
    name: &'static str,
    func: MetricFn,
}

impl NamedMetric {
    /// 以 `name` 注册 `func`.
    #[inline]
    pub const fn new(name: &'static str, func: MetricFn) -> Self {
        Self { name, func }
    }

    /// 指标名称.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 计算一对样本. 错误会被包装为 `SegError::Metric`.
    pub fn call(&self, prediction: ArrayViewD<'_, f32>, ground_truth: ArrayViewD<'_, f32>) -> SegResult<Measure> {
        (self.func)(prediction, ground_truth).map_err(|e| SegError::Metric {
            name: self.name,
            source: Box::new(e),
        })
    }
}

/// 一次评估会话的指标汇总: 按注册顺序排列的 (指标名, 均值).
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Summary {
    entries: Vec<(String, Measure)>,
}

impl Summary {
    /// 获取指标 `name` 的汇总值.
    pub fn get(&self, name: &str) -> Option<Measure> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| *m)
    }

    /// 按注册顺序迭代 (指标名, 汇总值).
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, Measure)> {
        self.entries.iter().map(|(n, m)| (n.as_str(), *m))
    }

    /// 指标个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 每行一个指标, 形如 `dice_score: 0.750000`.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, m) in self.iter() {
            writeln!(f, "{name}: {m}")?;
        }
        Ok(())
    }
}

/// 流式评估中的指标累加器.
///
/// 每个评估会话使用一个实例. `record` 和 `reset` 需要 `&mut self`,
/// 因此并发调用必须由调用方串行化.
///
/// # 失败语义
///
/// `record` 是全有或全无的: 先在暂存区计算所有指标, 全部成功后才写入.
/// 任一指标函数失败时, 该次调用不会留下任何指标值, 样本计数也不变.
#[derive(Clone, Debug)]
pub struct MetricManager {
    metrics: Vec<NamedMetric>,
    /// 与 `metrics` 一一对应.
    results: Vec<Vec<Measure>>,
    num_samples: usize,
}

impl MetricManager {
    /// 以有序的指标函数列表初始化.
    pub fn new(metrics: Vec<NamedMetric>) -> Self {
        let results = vec![Vec::new(); metrics.len()];
        Self {
            metrics,
            results,
            num_samples: 0,
        }
    }

    /// 以 [`super::default_metrics`] 初始化.
    #[inline]
    pub fn with_default_metrics() -> Self {
        Self::new(super::default_metrics())
    }

    /// 已注册的指标函数.
    #[inline]
    pub fn metrics(&self) -> &[NamedMetric] {
        &self.metrics
    }

    /// 已记录的样本个数.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// 指标 `name` 已记录的逐样本值. 未注册时返回 `None`.
    pub fn results(&self, name: &str) -> Option<&[Measure]> {
        self.metrics
            .iter()
            .position(|m| m.name == name)
            .map(|i| self.results[i].as_slice())
    }

    /// 对每一对 (预测, 真值) 计算所有指标并记录.
    ///
    /// 两个序列长度不一致时返回 `Err(SegError::ShapeMismatch)`;
    /// 任一指标函数失败时返回 `Err(SegError::Metric)`. 出错时状态不变.
    pub fn record(
        &mut self,
        predictions: &[ArrayViewD<'_, f32>],
        ground_truths: &[ArrayViewD<'_, f32>],
    ) -> SegResult<()> {
        check_batch_len(predictions, ground_truths)?;
        let staged = self
            .metrics
            .iter()
            .map(|m| {
                predictions
                    .iter()
                    .zip(ground_truths.iter())
                    .map(|(p, g)| m.call(p.view(), g.view()))
                    .collect::<SegResult<Vec<_>>>()
            })
            .collect::<SegResult<Vec<_>>>()?;
        self.commit(staged, predictions.len());
        Ok(())
    }

    /// 与 [`Self::record`] 相同, 但输入为沿第 0 轴堆叠的批次数组.
    pub fn record_batch(
        &mut self,
        predictions: ArrayViewD<'_, f32>,
        ground_truths: ArrayViewD<'_, f32>,
    ) -> SegResult<()> {
        if predictions.ndim() == 0 || ground_truths.ndim() == 0 {
            return Err(SegError::shape_mismatch(
                predictions.shape(),
                ground_truths.shape(),
            ));
        }
        let p: Vec<_> = predictions.axis_iter(Axis(0)).collect();
        let g: Vec<_> = ground_truths.axis_iter(Axis(0)).collect();
        self.record(&p, &g)
    }

    /// 各指标忽略无定义值后的均值.
    ///
    /// 某指标记录的值全部无定义 (或尚未记录任何值) 时, 汇总值为
    /// `Measure::Undefined` 而不是 0.
    pub fn summarize(&self) -> Summary {
        let entries = self
            .metrics
            .iter()
            .zip(self.results.iter())
            .map(|(m, r)| (m.name.to_string(), Measure::mean(r)))
            .collect();
        Summary { entries }
    }

    /// 清空所有记录和样本计数, 保留已注册的指标函数.
    pub fn reset(&mut self) {
        self.results.iter_mut().for_each(Vec::clear);
        self.num_samples = 0;
    }

    fn commit(&mut self, staged: Vec<Vec<Measure>>, batch_len: usize) {
        debug_assert_eq!(staged.len(), self.results.len());
        for (dst, src) in self.results.iter_mut().zip(staged) {
            dst.extend(src);
        }
        self.num_samples += batch_len;
        log::debug!("recorded {batch_len} samples, {} in total", self.num_samples);
    }
}

#[inline]
fn check_batch_len<P, G>(predictions: &[P], ground_truths: &[G]) -> SegResult<()> {
    if predictions.len() == ground_truths.len() {
        Ok(())
    } else {
        Err(SegError::shape_mismatch(
            &[predictions.len()],
            &[ground_truths.len()],
        ))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl MetricManager {
    /// 借助 `rayon`, 并行地计算所有 (指标, 样本) 组合, 再在当前线程写入.
    ///
    /// 语义与 [`Self::record`] 完全一致.
    pub fn par_record(
        &mut self,
        predictions: &[ArrayViewD<'_, f32>],
        ground_truths: &[ArrayViewD<'_, f32>],
    ) -> SegResult<()> {
        check_batch_len(predictions, ground_truths)?;
        let staged = self
            .metrics
            .par_iter()
            .map(|m| {
                predictions
                    .par_iter()
                    .zip(ground_truths.par_iter())
                    .map(|(p, g)| m.call(p.view(), g.view()))
                    .collect::<SegResult<Vec<_>>>()
            })
            .collect::<SegResult<Vec<_>>>()?;
        self.commit(staged, predictions.len());
        Ok(())
    }
}
