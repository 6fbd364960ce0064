use std::ops::Index;

use itertools::Itertools;
use ndarray::{Array3, ArrayView, ArrayView2, ArrayViewMut, Axis, Ix3};

use crate::consts::label::is_foreground;
use crate::error::{Error, Result};
use crate::{Idx2d, Idx3d};

pub mod codec;
pub mod mgh;
pub mod slice;

pub use codec::{FileCodec, VolumeCodec};
pub use slice::{ImgWriteVis, LabelSlice};

/// 3D MRI 扫描强度. 体素值以 `f32` 保存.
///
/// 方向归一化之后, 三个轴依次为 (切片, 高, 宽).
#[derive(Debug, Clone, PartialEq)]
pub struct MriScan {
    data: Array3<f32>,
}

impl Index<Idx3d> for MriScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<f32>> for MriScan {
    #[inline]
    fn from(data: Array3<f32>) -> Self {
        Self { data }
    }
}

impl MriScan {
    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取第 0 轴 (切片轴) 的长度.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 获取第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 按全局最小/最大值将强度线性归一化到 `[0, 1]`.
    ///
    /// 常量体数据 (最大值等于最小值) 会被置为全 0.
    pub fn normalize_min_max(&mut self) {
        use itertools::MinMaxResult;

        let (lo, hi) = match self.data.iter().copied().minmax() {
            MinMaxResult::NoElements => return,
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(lo, hi) => (lo, hi),
        };
        let range = hi - lo;
        if range > 0.0 {
            self.data.mapv_inplace(|v| (v - lo) / range);
        } else {
            self.data.fill(0.0);
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, f32, Ix3> {
        self.data.view_mut()
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_array(self) -> Array3<f32> {
        self.data
    }
}

/// 3D MRI 标注. 标签值以 `u16` 保存, 以容纳未重映射的原始 FreeSurfer 标签.
#[derive(Debug, Clone, PartialEq)]
pub struct MriLabel {
    data: Array3<u16>,
}

impl Index<Idx3d> for MriLabel {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<u16>> for MriLabel {
    #[inline]
    fn from(data: Array3<u16>) -> Self {
        Self { data }
    }
}

impl MriLabel {
    /// 由 `f32` 体数据 (例如 mgz 中以浮点存储的标签) 构造. 值会被四舍五入,
    /// 负值截断为 0.
    pub fn from_f32(data: &Array3<f32>) -> Self {
        Self {
            data: data.mapv(|v| v.round().max(0.0) as u16),
        }
    }

    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取水平切片形状大小.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取第 0 轴 (切片轴) 的长度.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 获取第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> LabelSlice<'_> {
        LabelSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = LabelSlice<'_>> {
        self.data.axis_iter(Axis(0)).map(LabelSlice::new)
    }

    /// 含有前景像素的首个和末个切片的索引 (闭区间). 全背景时返回 `None`.
    pub fn foreground_range(&self) -> Option<(usize, usize)> {
        let mut fg = self
            .slice_iter()
            .enumerate()
            .filter_map(|(i, s)| (!s.is_background()).then_some(i));
        let first = fg.next()?;
        Some((first, fg.last().unwrap_or(first)))
    }

    /// 获取标签中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u16) -> usize {
        self.data.iter().filter(|p| **p == label).count()
    }

    /// 最大标签值. 空标注返回 `None`.
    #[inline]
    pub fn max_label(&self) -> Option<u16> {
        self.data.iter().copied().max()
    }

    /// 是否含有前景像素.
    #[inline]
    pub fn has_foreground(&self) -> bool {
        self.data.iter().copied().any(is_foreground)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u16, Ix3> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut<'_, u16, Ix3> {
        self.data.view_mut()
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_array(self) -> Array3<u16> {
        self.data
    }
}

/// 成对的 3D MRI 扫描与标注.
///
/// 两者形状始终一致: 构造时检查, 之后任何变换都同时作用于两者.
#[derive(Debug, Clone, PartialEq)]
pub struct MriData3d {
    scan: MriScan,
    label: MriLabel,
}

impl MriData3d {
    /// 组合扫描与标注. 形状不一致时返回 `Err(Error::ShapeMismatch)`.
    pub fn new(scan: MriScan, label: MriLabel) -> Result<Self> {
        if scan.shape() != label.shape() {
            let (a, b, c) = scan.shape();
            let (x, y, z) = label.shape();
            return Err(Error::ShapeMismatch {
                context: "扫描与标注".to_owned(),
                expected: vec![a, b, c],
                found: vec![x, y, z],
            });
        }
        Ok(Self { scan, label })
    }

    /// 3D 扫描.
    #[inline]
    pub fn scan(&self) -> &MriScan {
        &self.scan
    }

    /// 3D 标注.
    #[inline]
    pub fn label(&self) -> &MriLabel {
        &self.label
    }

    /// 可变 3D 扫描. 只允许修改值, 不允许修改形状.
    #[inline]
    pub fn scan_mut(&mut self) -> &mut MriScan {
        &mut self.scan
    }

    /// 可变 3D 标注. 只允许修改值, 不允许修改形状.
    #[inline]
    pub fn label_mut(&mut self) -> &mut MriLabel {
        &mut self.label
    }

    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.label.shape()
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.label.len_z()
    }

    /// 同时对扫描和标注重排坐标轴. 结果保持标准内存布局.
    pub fn permuted_axes(self, axes: [usize; 3]) -> Self {
        let relayout = |a: Array3<f32>| a.permuted_axes(axes).as_standard_layout().into_owned();
        let scan = relayout(self.scan.data);
        let label = self
            .label
            .data
            .permuted_axes(axes)
            .as_standard_layout()
            .into_owned();
        Self {
            scan: scan.into(),
            label: label.into(),
        }
    }

    /// 沿切片轴同时挑选扫描与标注中 `indices` 所列的切片, 顺序与 `indices` 一致.
    ///
    /// 当任一索引越界时 panic.
    pub fn select_slices(&self, indices: &[usize]) -> Self {
        Self {
            scan: self.scan.data.select(Axis(0), indices).into(),
            label: self.label.data.select(Axis(0), indices).into(),
        }
    }

    /// 拆分为扫描与标注.
    #[inline]
    pub fn into_parts(self) -> (MriScan, MriLabel) {
        (self.scan, self.label)
    }
}
