//! 中位频率平衡 (median-frequency balancing) 类别权重.

use ndarray::{Array1, Array3};

use crate::data::MriLabel;

/// 每个类别一个权重, 长度为类别数.
pub type ClassWeights = Array1<f64>;

/// 与标注同形状的逐像素权重.
pub type PixelWeights = Array3<f32>;

/// 统计 `[0, num_class)` 内每个类别的像素个数. 范围外的标签不计入.
pub fn class_frequencies(label: &MriLabel, num_class: usize) -> Vec<usize> {
    let mut freq = vec![0usize; num_class];
    for &p in label.data().iter() {
        if let Some(slot) = freq.get_mut(p as usize) {
            *slot += 1;
        }
    }
    freq
}

/// 出现过的类别 (频数非零) 的频数中位数. 偶数个时取中间两项的均值.
///
/// 没有任何类别出现时返回 `None`.
pub fn median_frequency(freq: &[usize]) -> Option<f64> {
    let mut present: Vec<usize> = freq.iter().copied().filter(|&f| f > 0).collect();
    if present.is_empty() {
        return None;
    }
    present.sort_unstable();
    let mid = present.len() / 2;
    Some(if present.len() % 2 == 0 {
        (present[mid - 1] + present[mid]) as f64 / 2.0
    } else {
        present[mid] as f64
    })
}

/// 中位频率平衡: `w[c] = median / freq[c]`, 未出现的类别权重恰为 0.
///
/// 返回 (类别权重, 逐像素权重). 逐像素权重即该像素所属类别的权重,
/// 标签不在 `[0, num_class)` 内的像素权重为 0.
pub fn estimate_weights_mfb(label: &MriLabel, num_class: usize) -> (ClassWeights, PixelWeights) {
    let freq = class_frequencies(label, num_class);
    let class_weights = match median_frequency(&freq) {
        Some(median) => freq
            .iter()
            .map(|&f| if f == 0 { 0.0 } else { median / f as f64 })
            .collect(),
        None => Array1::zeros(num_class),
    };
    let pixel_weights = label
        .data()
        .mapv(|p| class_weights.get(p as usize).map_or(0.0, |&w| w as f32));
    (class_weights, pixel_weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_with_counts(counts: &[usize]) -> MriLabel {
        let v: Vec<u16> = counts
            .iter()
            .enumerate()
            .flat_map(|(c, &n)| std::iter::repeat(c as u16).take(n))
            .collect();
        Array3::from_shape_vec((1, 1, v.len()), v).unwrap().into()
    }

    #[test]
    fn test_absent_class_gets_zero() {
        let label = label_with_counts(&[10, 0, 30]);
        let (cw, pw) = estimate_weights_mfb(&label, 3);
        // 中位数取自 {10, 30}.
        assert_eq!(cw.to_vec(), vec![20.0 / 10.0, 0.0, 20.0 / 30.0]);
        assert!(cw.iter().all(|w| w.is_finite()));
        assert_eq!(pw.dim(), label.shape());
        assert_eq!(pw[(0, 0, 0)], 2.0);
        assert_eq!(pw[(0, 0, 39)], (20.0f64 / 30.0) as f32);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median_frequency(&[5, 1, 9]), Some(5.0));
        assert_eq!(median_frequency(&[4, 0, 2, 8, 6]), Some(5.0));
        assert_eq!(median_frequency(&[0, 0]), None);
    }

    #[test]
    fn test_out_of_range_labels() {
        let label: MriLabel = Array3::from_shape_vec((1, 1, 4), vec![0u16, 0, 1, 7])
            .unwrap()
            .into();
        let (cw, pw) = estimate_weights_mfb(&label, 2);
        assert_eq!(cw.to_vec(), vec![1.5 / 2.0, 1.5]);
        assert_eq!(pw[(0, 0, 3)], 0.0);
    }

    #[test]
    fn test_tiny_class_not_clamped() {
        let label = label_with_counts(&[1_000_000, 1, 1_000_000]);
        let (cw, _) = estimate_weights_mfb(&label, 3);
        assert_eq!(cw[1], 1_000_000.0);
    }
}
