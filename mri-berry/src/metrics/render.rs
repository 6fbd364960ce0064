//! 把指标渲染为 RGB 图像.

use image::{imageops, Rgb, RgbImage};
use ndarray::{ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::{ImgWriteVis, LabelSlice};

/// 热力图中每个单元格的边长 (像素).
pub const CELL: u32 = 12;

/// 柱状图的柱宽 (像素).
pub const BAR_WIDTH: u32 = 10;
/// 相邻两柱的间距 (像素).
pub const BAR_GAP: u32 = 2;
/// 满分柱的高度 (像素).
pub const BAR_HEIGHT: u32 = 120;

/// 样本面板中相邻图块之间的分隔宽度 (像素).
pub const PANEL_GAP: u32 = 2;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const SEPARATOR: Rgb<u8> = Rgb([128, 128, 128]);
const BAR: Rgb<u8> = Rgb([70, 130, 180]);
const BOX: Rgb<u8> = Rgb([176, 196, 222]);
const MEDIAN: Rgb<u8> = Rgb([255, 140, 0]);
const WHISKER: Rgb<u8> = Rgb([0, 0, 0]);

/// 白 → 深蓝色带. `t` 会被截断到 `[0, 1]`.
fn blues(t: f64) -> Rgb<u8> {
    const LO: [f64; 3] = [247.0, 251.0, 255.0];
    const HI: [f64; 3] = [8.0, 48.0, 107.0];
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let mix = |c: usize| (LO[c] + (HI[c] - LO[c]) * t).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

/// Dice 混淆矩阵热力图. 第 `i` 行 `j` 列对应真值类别 `i`, 预测类别 `j`.
pub fn confusion_heatmap(cm: ArrayView2<'_, f64>) -> RgbImage {
    let (rows, cols) = cm.dim();
    let mut img = RgbImage::new(cols as u32 * CELL, rows as u32 * CELL);
    for (x, y, pix) in img.enumerate_pixels_mut() {
        *pix = blues(cm[((y / CELL) as usize, (x / CELL) as usize)]);
    }
    img
}

/// 逐类 Dice 柱状图. 柱高与得分成正比, 满分为 [`BAR_HEIGHT`].
pub fn dice_bars(scores: ArrayView1<'_, f64>) -> RgbImage {
    let n = scores.len() as u32;
    let mut img = RgbImage::from_pixel(n * (BAR_WIDTH + BAR_GAP) + BAR_GAP, BAR_HEIGHT, WHITE);
    for (c, &s) in scores.iter().enumerate() {
        let s = if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) };
        let h = (s * BAR_HEIGHT as f64).round() as u32;
        let x0 = BAR_GAP + c as u32 * (BAR_WIDTH + BAR_GAP);
        for x in x0..x0 + BAR_WIDTH {
            for y in BAR_HEIGHT - h..BAR_HEIGHT {
                img.put_pixel(x, y, BAR);
            }
        }
    }
    img
}

/// 已排序样本的线性插值分位数. `sorted` 不能为空.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// 一个类别的箱线图统计量.
///
/// 须线延伸到距箱体 1.5 倍四分位距以内的最远样本.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    /// 下须线.
    pub low: f64,
    /// 下四分位数.
    pub q1: f64,
    /// 中位数.
    pub median: f64,
    /// 上四分位数.
    pub q3: f64,
    /// 上须线.
    pub high: f64,
}

impl BoxStats {
    /// 由样本计算统计量. 忽略 NaN, 没有有效样本时返回 `None`.
    pub fn from_samples<I: IntoIterator<Item = f64>>(samples: I) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.into_iter().filter(|s| !s.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let (q1, median, q3) = (
            quantile(&sorted, 0.25),
            quantile(&sorted, 0.5),
            quantile(&sorted, 0.75),
        );
        let reach = 1.5 * (q3 - q1);
        let low = sorted.iter().copied().find(|&s| s >= q1 - reach).unwrap_or(q1);
        let high = sorted.iter().rev().copied().find(|&s| s <= q3 + reach).unwrap_or(q3);
        Some(Self {
            low,
            q1,
            median,
            q3,
            high,
        })
    }
}

/// 得分 `v` 所在的像素行, 满分在顶部.
fn score_row(v: f64) -> u32 {
    let v = v.clamp(0.0, 1.0);
    BAR_HEIGHT - 1 - (v * (BAR_HEIGHT - 1) as f64).round() as u32
}

/// 逐类 Dice 箱线图. `class_dist` 每行为一个样本 (如一个体数据), 每列为一个类别.
///
/// 须线以外的样本以单个像素标出.
pub fn dice_box_plot(class_dist: ArrayView2<'_, f64>) -> RgbImage {
    let n = class_dist.ncols() as u32;
    let mut img = RgbImage::from_pixel(n * (BAR_WIDTH + BAR_GAP) + BAR_GAP, BAR_HEIGHT, WHITE);
    for (c, column) in class_dist.axis_iter(Axis(1)).enumerate() {
        let Some(stats) = BoxStats::from_samples(column.iter().copied()) else {
            continue;
        };
        let x0 = BAR_GAP + c as u32 * (BAR_WIDTH + BAR_GAP);
        let mid = x0 + BAR_WIDTH / 2;
        for y in score_row(stats.high)..=score_row(stats.low) {
            img.put_pixel(mid, y, WHISKER);
        }
        for y in score_row(stats.q3)..=score_row(stats.q1) {
            for x in x0..x0 + BAR_WIDTH {
                img.put_pixel(x, y, BOX);
            }
        }
        for x in x0..x0 + BAR_WIDTH {
            img.put_pixel(x, score_row(stats.low), WHISKER);
            img.put_pixel(x, score_row(stats.high), WHISKER);
            img.put_pixel(x, score_row(stats.median), MEDIAN);
        }
        for &s in column.iter().filter(|s| **s < stats.low || **s > stats.high) {
            img.put_pixel(mid, score_row(s), WHISKER);
        }
    }
    img
}

/// 两列样本面板: 每行左侧为预测, 右侧为真值.
///
/// 当 `prediction` 与 `ground_truth` 形状不同时 panic.
pub fn sample_panel(
    prediction: ArrayView3<'_, u16>,
    ground_truth: ArrayView3<'_, u16>,
    num_class: usize,
) -> RgbImage {
    assert_eq!(prediction.shape(), ground_truth.shape(), "预测与真值形状不一致");
    let (n, h, w) = prediction.dim();
    let (h, w) = (h as u32, w as u32);
    let width = 2 * w + 3 * PANEL_GAP;
    let height = n as u32 * (h + PANEL_GAP) + PANEL_GAP;
    let mut panel = RgbImage::from_pixel(width, height, SEPARATOR);

    let rows = prediction
        .axis_iter(Axis(0))
        .zip(ground_truth.axis_iter(Axis(0)));
    for (row, (pred, gt)) in rows.enumerate() {
        let y = (PANEL_GAP + row as u32 * (h + PANEL_GAP)) as i64;
        let left = LabelSlice::from(pred).render(num_class);
        let right = LabelSlice::from(gt).render(num_class);
        imageops::replace(&mut panel, &left, PANEL_GAP as i64, y);
        imageops::replace(&mut panel, &right, (2 * PANEL_GAP + w) as i64, y);
    }
    panel
}
