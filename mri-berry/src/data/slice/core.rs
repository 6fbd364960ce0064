use crate::consts::label::is_background;
use crate::Idx2d;
use ndarray::iter::Iter;
use ndarray::{ArrayView2, Ix2};
use std::ops::Index;

/// 不可变、借用的二维 MRI 标签切片.
#[derive(Clone, Copy, Debug)]
pub struct LabelSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::MriLabel`] 或任意 2D 标签数组.
    data: ArrayView2<'a, u16>,
}

impl Index<Idx2d> for LabelSlice<'_> {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> From<ArrayView2<'a, u16>> for LabelSlice<'a> {
    #[inline]
    fn from(data: ArrayView2<'a, u16>) -> Self {
        Self::new(data)
    }
}

impl<'a> LabelSlice<'a> {
    /// 直接初始化.
    #[inline]
    pub(crate) fn new(data: ArrayView2<'a, u16>) -> Self {
        Self { data }
    }

    /// 获得 **底层** 数据的一份不可变 shallow copy.
    #[inline]
    pub fn array_view(&self) -> ArrayView2<'a, u16> {
        self.data
    }

    /// 获取可以迭代图像像素的迭代器.
    #[inline]
    pub fn iter(&self) -> Iter<'_, u16, Ix2> {
        self.data.iter()
    }

    /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> Option<&u16> {
        self.data.get(pos)
    }

    /// 该图是否为全背景图?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 图像的分辨率 (高, 宽).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }

    /// 图像的像素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 统计图像中值为 `label` 的像素总个数.
    #[inline]
    pub fn count(&self, label: u16) -> usize {
        self.data.iter().filter(|&p| *p == label).count()
    }

    /// 以行优先规则, 获取能迭代图像所有 `(索引, 像素值)` 的迭代器.
    #[inline]
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &u16)> {
        self.data.indexed_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::LabelSlice;
    use ndarray::array;

    #[test]
    fn test_background_and_count() {
        let fg = array![[0u16, 3], [3, 0]];
        let bg = array![[0u16, 0], [0, 0]];
        let s = LabelSlice::from(fg.view());
        assert!(!s.is_background());
        assert_eq!(s.count(3), 2);
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.get((5, 0)), None);
        assert!(LabelSlice::from(bg.view()).is_background());
        assert_eq!(s.array_view(), fg.view());
    }
}
