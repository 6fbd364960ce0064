//! 训练期的只读随机访问数据集.

use std::path::Path;

use ndarray::{Array3, Array4, ArrayD, ArrayView2, ArrayView3, Axis, Ix3, Ix4};

use super::corpus::Split;
use super::npz_database::NpzArchive;
use crate::error::{Error, Result};

/// 数据集中的一个条目, 借用于 [`ImdbData`].
#[derive(Clone, Copy, Debug)]
pub struct ImdbEntry<'a> {
    /// 图像, 形状 (C, H, W).
    pub image: ArrayView3<'a, f32>,

    /// 标注, 形状 (H, W).
    pub label: ArrayView2<'a, u16>,

    /// 逐像素权重, 形状 (H, W).
    pub weight: ArrayView2<'a, f32>,
}

/// 由 (图像, 标注, 权重) 三个并行数组组成的只读数据集.
///
/// 图像总是以 (N, C, H, W) 存储: 构造时若传入 (N, H, W), 会在第 1 轴插入大小为 1
/// 的通道轴.
///
/// # 注意
///
/// 构造时不检查三个数组的首维是否一致, 由调用方保证.
#[derive(Debug, Clone)]
pub struct ImdbData {
    x: Array4<f32>,
    y: Array3<u16>,
    w: Array3<f32>,
}

impl ImdbData {
    /// 构造数据集. 图像必须是 3 维或 4 维, 否则返回 `Err(Error::ShapeMismatch)`.
    pub fn new(x: ArrayD<f32>, y: Array3<u16>, w: Array3<f32>) -> Result<Self> {
        let found = x.shape().to_vec();
        let x = match x.ndim() {
            3 => x
                .into_dimensionality::<Ix3>()
                .map(|a| a.insert_axis(Axis(1))),
            _ => x.into_dimensionality::<Ix4>(),
        }
        .map_err(|_| Error::ShapeMismatch {
            context: "数据集图像维数".to_owned(),
            expected: vec![0, 0, 0, 0],
            found,
        })?;
        Ok(Self { x, y, w })
    }

    /// 条目个数, 即标注数组的首维长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.y.len_of(Axis(0))
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 图像数组, 形状 (N, C, H, W).
    #[inline]
    pub fn images(&self) -> &Array4<f32> {
        &self.x
    }

    /// 获取第 `index` 个条目. 越界时返回 `Err(Error::IndexOutOfRange)`.
    pub fn get(&self, index: usize) -> Result<ImdbEntry<'_>> {
        let len = self.len();
        let out_of_range = Error::IndexOutOfRange { index, len };
        if index >= len || index >= self.x.len_of(Axis(0)) || index >= self.w.len_of(Axis(0)) {
            return Err(out_of_range);
        }
        Ok(ImdbEntry {
            image: self.x.index_axis(Axis(0), index),
            label: self.y.index_axis(Axis(0), index),
            weight: self.w.index_axis(Axis(0), index),
        })
    }

    /// 按索引顺序迭代所有条目.
    pub fn iter(&self) -> impl Iterator<Item = ImdbEntry<'_>> {
        (0..self.len()).map_while(|i| self.get(i).ok())
    }
}

/// 从语料目录 `dir` 读取训练集与测试集.
///
/// 每个条目的权重取逐像素权重数组.
pub fn get_data<P: AsRef<Path>>(dir: P) -> Result<(ImdbData, ImdbData)> {
    let archive = NpzArchive::new(dir.as_ref());
    let load = |split| -> Result<ImdbData> {
        ImdbData::new(
            archive.data(split)?.into_dyn(),
            archive.label(split)?,
            archive.weights(split)?,
        )
    };
    Ok((load(Split::Train)?, load(Split::Test)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{save_corpus, Corpus};
    use ndarray::{Array1, IxDyn};

    fn parts(n: usize) -> (Array3<u16>, Array3<f32>) {
        (Array3::zeros((n, 4, 5)), Array3::ones((n, 4, 5)))
    }

    #[test]
    fn test_rank3_gets_channel_axis() {
        let (y, w) = parts(2);
        let x = ArrayD::<f32>::zeros(IxDyn(&[2, 4, 5]));
        let ds = ImdbData::new(x, y, w).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.images().dim(), (2, 1, 4, 5));
        let entry = ds.get(1).unwrap();
        assert_eq!(entry.image.dim(), (1, 4, 5));
        assert_eq!(entry.label.dim(), (4, 5));
        assert_eq!(entry.weight[(3, 4)], 1.0);
    }

    #[test]
    fn test_rank4_kept() {
        let (y, w) = parts(2);
        let x = ArrayD::<f32>::zeros(IxDyn(&[2, 3, 4, 5]));
        let ds = ImdbData::new(x, y, w).unwrap();
        assert_eq!(ds.get(0).unwrap().image.dim(), (3, 4, 5));
        assert_eq!(ds.iter().count(), 2);
    }

    #[test]
    fn test_bad_rank_and_index() {
        let (y, w) = parts(2);
        assert!(ImdbData::new(ArrayD::zeros(IxDyn(&[2, 20])), y.clone(), w.clone()).is_err());

        let ds = ImdbData::new(ArrayD::zeros(IxDyn(&[2, 4, 5])), y, w).unwrap();
        assert!(matches!(
            ds.get(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        ));
    }

    #[test]
    fn test_get_data_from_archives() {
        let dir = tempfile::tempdir().unwrap();
        for (split, n) in [(Split::Train, 3), (Split::Test, 1)] {
            let (y, w) = parts(n);
            let corpus =
                Corpus::from_parts(Array3::zeros((n, 4, 5)), y, Array1::zeros(2), w).unwrap();
            save_corpus(dir.path(), split, &corpus).unwrap();
        }
        let (train, test) = get_data(dir.path()).unwrap();
        assert_eq!((train.len(), test.len()), (3, 1));
        assert_eq!(train.images().dim(), (3, 1, 4, 5));
    }
}
