//! 分割结果评估: 逐类 Dice 与 Dice 混淆矩阵.

use ndarray::{Array1, Array2, Array3, ArrayView3, ArrayView4, Axis, Zip};

/// Dice 分母的平滑项, 避免空类别时除以 0.
pub const DICE_EPS: f64 = 1e-4;

/// 对 (N, C, H, W) 的逐类得分沿类别轴取 argmax, 得到 (N, H, W) 的预测类别.
///
/// 得分相同时取较小的类别 ID.
pub fn argmax_classes(predictions: ArrayView4<'_, f32>) -> Array3<u16> {
    let (n, _, h, w) = predictions.dim();
    let mut out = Array3::zeros((n, h, w));
    Zip::from(&mut out)
        .and(predictions.lanes(Axis(1)))
        .for_each(|o, lane| {
            let mut best = 0usize;
            for (c, &v) in lane.iter().enumerate() {
                if v > lane[best] {
                    best = c;
                }
            }
            *o = best as u16;
        });
    out
}

/// 预测与真值中每个类别的像素个数, 以及两两交集的像素个数.
///
/// 返回 (gt 计数, pred 计数, 交集矩阵 `inter[gt][pred]`).
fn overlap_counts(
    output: ArrayView3<'_, u16>,
    ground_truth: ArrayView3<'_, u16>,
    num_class: usize,
) -> (Vec<f64>, Vec<f64>, Array2<f64>) {
    let mut gt = vec![0.0; num_class];
    let mut pred = vec![0.0; num_class];
    let mut inter = Array2::zeros((num_class, num_class));
    Zip::from(&output).and(&ground_truth).for_each(|&p, &g| {
        let (p, g) = (p as usize, g as usize);
        if p < num_class {
            pred[p] += 1.0;
        }
        if g < num_class {
            gt[g] += 1.0;
        }
        if p < num_class && g < num_class {
            inter[(g, p)] += 1.0;
        }
    });
    (gt, pred, inter)
}

#[inline]
fn dice(inter: f64, gt: f64, pred: f64) -> f64 {
    2.0 * inter / (gt + pred + DICE_EPS)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn fill_indexed<F>(m: &mut Array2<f64>, f: F)
        where
            F: Fn((usize, usize)) -> f64 + Send + Sync,
        {
            Zip::indexed(m).par_for_each(|ix, v| *v = f(ix));
        }
    } else {
        fn fill_indexed<F>(m: &mut Array2<f64>, f: F)
        where
            F: Fn((usize, usize)) -> f64,
        {
            Zip::indexed(m).for_each(|ix, v| *v = f(ix));
        }
    }
}

/// Dice 混淆矩阵: `cm[i][j] = 2·|GT_i ∩ Pred_j| / (|GT_i| + |Pred_j| + ε)`.
///
/// 返回 (对角线均值, 混淆矩阵).
pub fn dice_confusion_matrix(
    output: ArrayView3<'_, u16>,
    ground_truth: ArrayView3<'_, u16>,
    num_class: usize,
) -> (f64, Array2<f64>) {
    let (gt, pred, inter) = overlap_counts(output, ground_truth, num_class);
    let mut cm = Array2::zeros((num_class, num_class));
    fill_indexed(&mut cm, |(i, j)| dice(inter[(i, j)], gt[i], pred[j]));

    let avg = if num_class == 0 {
        0.0
    } else {
        cm.diag().sum() / num_class as f64
    };
    (avg, cm)
}

/// 逐类 Dice: `d[c] = 2·|GT_c ∩ Pred_c| / (|GT_c| + |Pred_c| + ε)`.
pub fn dice_score_perclass(
    output: ArrayView3<'_, u16>,
    ground_truth: ArrayView3<'_, u16>,
    num_class: usize,
) -> Array1<f64> {
    let (gt, pred, inter) = overlap_counts(output, ground_truth, num_class);
    (0..num_class)
        .map(|c| dice(inter[(c, c)], gt[c], pred[c]))
        .collect()
}
