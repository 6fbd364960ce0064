//! 单个划分 (训练/测试) 的扁平化 2D 切片语料.

use std::fmt;
use std::str::FromStr;

use ndarray::{concatenate, Array1, Array3, ArrayView1, ArrayView3, Axis};

use super::builder::ProcessedVolume;
use crate::error::{Error, Result};

/// 数据集划分.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Split {
    /// 训练集.
    Train,

    /// 测试集.
    Test,
}

impl Split {
    /// 全部划分.
    pub const ALL: [Split; 2] = [Self::Train, Self::Test];

    /// 文件名与数组名中使用的标识.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|x| x.token() == s)
            .ok_or_else(|| format!("未知的划分 `{s}`"))
    }
}

/// 沿切片轴拼接切片形状一致的 3D 数组.
fn stack<A: Clone>(views: &[ArrayView3<'_, A>]) -> Array3<A> {
    // 调用方已校验切片形状, 该操作不会生成 `Err`, 可直接 unwrap.
    concatenate(Axis(0), views).unwrap()
}

/// 一个划分内所有体数据的切片拼接结果.
///
/// `data`, `label`, `weights` 共享同一条切片轴 (长度 `S`);
/// `class_weights` 是各体数据类别权重向量的首尾拼接 (长度 `V * num_class`).
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    data: Array3<f32>,
    label: Array3<u16>,
    class_weights: Array1<f64>,
    weights: Array3<f32>,
}

impl Corpus {
    /// 直接由四个数组构造. 三个 3D 数组的形状必须一致, 否则返回 `Err`.
    pub fn from_parts(
        data: Array3<f32>,
        label: Array3<u16>,
        class_weights: Array1<f64>,
        weights: Array3<f32>,
    ) -> Result<Self> {
        for (name, shape) in [("label", label.shape()), ("weights", weights.shape())] {
            if shape != data.shape() {
                return Err(Error::ShapeMismatch {
                    context: format!("语料 {name}"),
                    expected: data.shape().to_vec(),
                    found: shape.to_vec(),
                });
            }
        }
        Ok(Self {
            data,
            label,
            class_weights,
            weights,
        })
    }

    /// 沿切片轴拼接各体数据, 保持输入顺序.
    ///
    /// 所有体数据的切片 (H, W) 必须与第一个体数据一致, 否则返回
    /// `Err(Error::ShapeMismatch)`. 缺少权重的体数据同样视为错误.
    pub fn concat(volumes: &[ProcessedVolume]) -> Result<Self> {
        let Some(first) = volumes.first() else {
            return Self::from_parts(
                Array3::zeros((0, 0, 0)),
                Array3::zeros((0, 0, 0)),
                Array1::zeros(0),
                Array3::zeros((0, 0, 0)),
            );
        };
        let (_, h, w) = first.data.shape();
        let mut weights = Vec::with_capacity(volumes.len());
        for v in volumes {
            let (_, vh, vw) = v.data.shape();
            if (vh, vw) != (h, w) {
                return Err(Error::ShapeMismatch {
                    context: format!("体数据 `{}` 的切片形状", v.id),
                    expected: vec![h, w],
                    found: vec![vh, vw],
                });
            }
            let pair = v
                .weights
                .as_ref()
                .ok_or_else(|| Error::MissingWeights(v.id.clone()))?;
            weights.push(pair);
        }

        let data = stack(&volumes.iter().map(|v| v.data.scan().data()).collect::<Vec<_>>());
        let label = stack(&volumes.iter().map(|v| v.data.label().data()).collect::<Vec<_>>());
        let pixel = stack(&weights.iter().map(|(_, p)| p.view()).collect::<Vec<_>>());
        let class: Vec<ArrayView1<'_, f64>> = weights.iter().map(|(c, _)| c.view()).collect();
        // 一维数组总能拼接, 可直接 unwrap.
        let class_weights = concatenate(Axis(0), &class).unwrap();

        Self::from_parts(data, label, class_weights, pixel)
    }

    /// 切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.label.len_of(Axis(0))
    }

    /// 是否不含任何切片.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 扫描切片, 形状 (S, H, W).
    #[inline]
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// 标注切片, 形状 (S, H, W).
    #[inline]
    pub fn label(&self) -> &Array3<u16> {
        &self.label
    }

    /// 拼接后的类别权重, 长度 V * num_class.
    #[inline]
    pub fn class_weights(&self) -> &Array1<f64> {
        &self.class_weights
    }

    /// 逐像素权重, 形状 (S, H, W).
    #[inline]
    pub fn weights(&self) -> &Array3<f32> {
        &self.weights
    }

    /// 拆分为 (data, label, class_weights, weights).
    #[inline]
    pub fn into_parts(self) -> (Array3<f32>, Array3<u16>, Array1<f64>, Array3<f32>) {
        (self.data, self.label, self.class_weights, self.weights)
    }
}
