//! 跨批次累加的指标缓冲.

use ndarray::{Array, Array1, Array2, ArrayView, Dimension, Ix1, Ix2};

/// 一个 epoch 内按批次累加的指标和.
///
/// `update` 把一个批次的结果加到总和上, `drain` 取出总和与批次数并清零.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator<D: Dimension> {
    sum: Array<f64, D>,
    batches: usize,
}

/// 混淆矩阵累加器, 形状为 `(num_class, num_class)`.
pub type ConfusionAccumulator = Accumulator<Ix2>;

/// 逐类 Dice 累加器, 长度为 `num_class`.
pub type DiceAccumulator = Accumulator<Ix1>;

/// `drain` 的结果: 累加和与参与累加的批次数.
#[derive(Debug, Clone, PartialEq)]
pub struct Drained<D: Dimension> {
    /// 各批次结果之和 (未做平均).
    pub sum: Array<f64, D>,
    /// 批次数.
    pub batches: usize,
}

impl<D: Dimension> Drained<D> {
    /// 按批次数平均. 没有任何批次时返回全 0.
    pub fn mean(&self) -> Array<f64, D> {
        if self.batches == 0 {
            Array::zeros(self.sum.raw_dim())
        } else {
            &self.sum / self.batches as f64
        }
    }
}

impl<D: Dimension> Accumulator<D> {
    /// 清零总和与批次数.
    pub fn reset(&mut self) {
        self.sum.fill(0.0);
        self.batches = 0;
    }

    /// 累加一个批次的结果.
    ///
    /// 当 `batch` 的形状与累加器不一致时 panic.
    pub fn update(&mut self, batch: ArrayView<'_, f64, D>) {
        assert_eq!(self.sum.shape(), batch.shape(), "批次指标形状不一致");
        self.sum += &batch;
        self.batches += 1;
    }

    /// 取出总和与批次数, 并把累加器清零.
    pub fn drain(&mut self) -> Drained<D> {
        let dim = self.sum.raw_dim();
        let sum = std::mem::replace(&mut self.sum, Array::zeros(dim));
        let batches = std::mem::take(&mut self.batches);
        Drained { sum, batches }
    }

    /// 已累加的批次数.
    #[inline]
    pub fn batches(&self) -> usize {
        self.batches
    }
}

impl ConfusionAccumulator {
    /// `num_class × num_class` 的全 0 累加器.
    pub fn new(num_class: usize) -> Self {
        Self {
            sum: Array2::zeros((num_class, num_class)),
            batches: 0,
        }
    }
}

impl DiceAccumulator {
    /// 长度为 `num_class` 的全 0 累加器.
    pub fn new(num_class: usize) -> Self {
        Self {
            sum: Array1::zeros(num_class),
            batches: 0,
        }
    }
}
