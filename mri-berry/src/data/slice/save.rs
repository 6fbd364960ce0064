//! 标签图像的可视化与持久化存储.

use crate::LabelSlice;
use image::{ImageResult, Rgb, RgbImage};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式渲染并持久化存储的标签图像.
///
/// 每个类别 ID 会被映射到固定的伪彩色, 背景为黑色,
/// 而不是按原样把类别 ID 作为灰度值写入.
pub trait ImgWriteVis {
    /// 以 `num_class` 个类别的调色板渲染为 RGB 图像.
    fn render(&self, num_class: usize) -> RgbImage;

    /// 按照可视化规则将图片保存到 `path` 路径.
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P, num_class: usize) -> ImageResult<()> {
        self.render(num_class).save(path)
    }
}

/// 类别 `label` 在 `num_class` 色调色板中的颜色.
///
/// 背景为黑色, 其余类别沿 黑 → 蓝紫 → 红 → 黄 → 白 的色带均匀取色,
/// 超出 `num_class` 的标签按最后一个类别着色.
pub fn class_color(label: u16, num_class: usize) -> Rgb<u8> {
    // 色带控制点.
    const RAMP: [[f32; 3]; 5] = [
        [0.0, 0.0, 0.0],
        [0.3, 0.15, 0.75],
        [0.9, 0.2, 0.3],
        [1.0, 0.85, 0.1],
        [1.0, 1.0, 1.0],
    ];
    if label == 0 || num_class <= 1 {
        return Rgb([0, 0, 0]);
    }
    let top = (num_class - 1) as f32;
    let t = (label as f32).min(top) / top * (RAMP.len() - 1) as f32;
    let lo = (t.floor() as usize).min(RAMP.len() - 2);
    let frac = t - lo as f32;
    let mix = |c: usize| {
        let v = RAMP[lo][c] + (RAMP[lo + 1][c] - RAMP[lo][c]) * frac;
        (v * 255.0).round() as u8
    };
    Rgb([mix(0), mix(1), mix(2)])
}

impl ImgWriteVis for LabelSlice<'_> {
    fn render(&self, num_class: usize) -> RgbImage {
        let (height, width) = self.shape();
        let mut buf = RgbImage::new(width as u32, height as u32);
        for ((h, w), &pix) in self.indexed_iter() {
            buf.put_pixel(w as u32, h as u32, class_color(pix, num_class));
        }
        buf
    }
}
