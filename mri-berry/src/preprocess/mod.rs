//! 体数据预处理. 均为无状态的纯函数, 同时作用于扫描与标注.
//!
//! 语料构建时的固定顺序为:
//!
//! 1. [`rotate_orientation`] 方向归一化;
//! 2. [`reduce_slices`] 去除首尾全背景切片;
//! 3. [`remap_labels`] 标签重映射;
//! 4. [`remove_black`] 去除所有全背景切片;
//! 5. [`estimate_weights_mfb`] 类别权重估计.

mod orientation;
mod remap;
mod weights;

pub use orientation::{rotate_orientation, Orientation};
pub use remap::{remap_labels, RemapConfig};
pub use weights::{
    class_frequencies, estimate_weights_mfb, median_frequency, ClassWeights, PixelWeights,
};

use crate::data::MriData3d;

/// 去除切片轴首尾连续的全背景切片, 保留首个与末个前景切片之间的连续区段.
///
/// 区段内部的全背景切片会被保留. 标注全为背景时返回 0 个切片.
pub fn reduce_slices(data: &MriData3d) -> MriData3d {
    let keep: Vec<usize> = match data.label().foreground_range() {
        Some((first, last)) => (first..=last).collect(),
        None => Vec::new(),
    };
    data.select_slices(&keep)
}

/// 去除所有标注全为背景的切片 (包括区段内部的), 其余切片保持原有顺序.
pub fn remove_black(data: &MriData3d) -> MriData3d {
    let keep: Vec<usize> = data
        .label()
        .slice_iter()
        .enumerate()
        .filter_map(|(i, s)| (!s.is_background()).then_some(i))
        .collect();
    data.select_slices(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MriLabel, MriScan};
    use ndarray::Array3;

    /// 第 `i` 个切片的扫描值全为 `i`, 前景切片的标注含一个类别 5 像素.
    fn stack(fg: &[bool]) -> MriData3d {
        let scan = Array3::from_shape_fn((fg.len(), 3, 3), |(i, _, _)| i as f32);
        let label = Array3::from_shape_fn((fg.len(), 3, 3), |(i, h, w)| {
            if fg[i] && h == 1 && w == 2 {
                5u16
            } else {
                0
            }
        });
        MriData3d::new(MriScan::from(scan), MriLabel::from(label)).unwrap()
    }

    fn kept(d: &MriData3d) -> Vec<usize> {
        (0..d.len_z()).map(|i| d.scan()[(i, 0, 0)] as usize).collect()
    }

    const PATTERN: [bool; 7] = [false, false, true, false, true, true, false];

    #[test]
    fn test_reduce_keeps_interior() {
        let out = reduce_slices(&stack(&PATTERN));
        assert_eq!(kept(&out), [2, 3, 4, 5]);
        assert_eq!(out.shape(), (4, 3, 3));
    }

    #[test]
    fn test_reduce_all_background() {
        let out = reduce_slices(&stack(&[false; 4]));
        assert_eq!(out.len_z(), 0);
        assert_eq!(kept(&reduce_slices(&stack(&[true; 3]))), [0, 1, 2]);
    }

    #[test]
    fn test_remove_black() {
        let input = stack(&PATTERN);
        let out = remove_black(&input);
        assert_eq!(kept(&out), [2, 4, 5]);
        assert_eq!(out.len_z(), PATTERN.iter().filter(|f| **f).count());
        assert!(out.label().slice_iter().all(|s| !s.is_background()));
    }

    #[test]
    fn test_reduce_then_remove() {
        let out = remove_black(&reduce_slices(&stack(&PATTERN)));
        assert_eq!(kept(&out), [2, 4, 5]);
    }
}
