//! 语料构建: 逐个加载体数据, 按固定顺序预处理, 再拼接为一个划分的语料.

use std::io::Write;
use std::path::Path;

use log::{debug, info, warn};

use super::corpus::Corpus;
use super::generic::{data_loader, read_volume_list, VolumePaths};
use crate::data::{MriData3d, VolumeCodec};
use crate::error::Result;
use crate::preprocess::{self, ClassWeights, Orientation, PixelWeights, RemapConfig};

/// 可选预处理步骤的开关.
///
/// 无论开关如何组合, 步骤总是按
/// 方向归一化 → `reduce_slices` → `remap` → `remove_black` → `weights`
/// 的顺序执行.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PipelineSteps {
    /// 去除首尾全背景切片.
    pub reduce_slices: bool,

    /// 标签重映射配置. `None` 表示保留原始标签.
    pub remap: Option<RemapConfig>,

    /// 去除所有全背景切片.
    pub remove_black: bool,

    /// 估计类别权重与逐像素权重.
    pub weights: bool,
}

impl PipelineSteps {
    /// 语料构建使用的配置: 全部步骤开启.
    #[inline]
    pub const fn all(remap: RemapConfig) -> Self {
        Self {
            reduce_slices: true,
            remap: Some(remap),
            remove_black: true,
            weights: true,
        }
    }
}

/// 预处理完成的单个体数据.
#[derive(Debug, Clone)]
pub struct ProcessedVolume {
    /// 体数据 ID.
    pub id: String,

    /// 预处理后的扫描与标注, 形状 (切片, H, W).
    pub data: MriData3d,

    /// (类别权重, 逐像素权重). 仅在 [`PipelineSteps::weights`] 开启时存在.
    pub weights: Option<(ClassWeights, PixelWeights)>,
}

/// 对单个已加载的体数据执行预处理.
///
/// 强度先按全局最小/最大值归一化到 `[0, 1]`, 再依次执行各步骤.
/// 若未做重映射, 类别数取该体数据的最大标签值加一.
pub fn preprocess_volume(
    id: String,
    mut data: MriData3d,
    orientation: Orientation,
    steps: &PipelineSteps,
) -> ProcessedVolume {
    data.scan_mut().normalize_min_max();
    let mut data = preprocess::rotate_orientation(data, orientation);
    debug!("`{id}`: 方向 {orientation} 归一化后形状 {:?}", data.shape());

    if steps.reduce_slices {
        data = preprocess::reduce_slices(&data);
        debug!("`{id}`: reduce_slices 后剩余 {} 个切片", data.len_z());
    }
    if let Some(config) = steps.remap {
        let remapped = preprocess::remap_labels(data.label(), config);
        *data.label_mut() = remapped;
    }
    if steps.remove_black {
        data = preprocess::remove_black(&data);
        debug!("`{id}`: remove_black 后剩余 {} 个切片", data.len_z());
    }
    if data.len_z() == 0 {
        warn!("体数据 `{id}` 预处理后不含任何切片");
    }

    let weights = steps.weights.then(|| {
        let num_class = match steps.remap {
            Some(config) => config.num_class(),
            None => data.label().max_label().map_or(1, |m| m as usize + 1),
        };
        preprocess::estimate_weights_mfb(data.label(), num_class)
    });

    ProcessedVolume { id, data, weights }
}

/// 按 ID 顺序加载并预处理 `ids` 中的所有体数据.
///
/// 每处理完一个体数据, 在标准输出打印一个 `#` 进度标记, 全部完成后打印 `100%`.
/// 任一体数据失败都会立即中止并返回错误.
pub fn preprocess_volumes<C: VolumeCodec>(
    codec: &C,
    paths: &VolumePaths,
    ids: Vec<String>,
    orientation: Orientation,
    steps: &PipelineSteps,
) -> Result<Vec<ProcessedVolume>> {
    println!("Loading and preprocessing data...");
    let mut out = Vec::with_capacity(ids.len());
    for (id, data) in data_loader(codec, paths, ids) {
        let data = data?;
        info!("加载体数据 `{id}`, 形状 {:?}", data.shape());
        out.push(preprocess_volume(id, data, orientation, steps));

        print!("#");
        // 进度标记仅用于展示, 刷新失败不影响结果.
        let _ = std::io::stdout().flush();
    }
    println!("100%");
    Ok(out)
}

/// 从 ID 列表文件 `volumes_txt_file` 读取 ID, 然后加载并预处理.
pub fn load_and_preprocess<C: VolumeCodec, P: AsRef<Path>>(
    codec: &C,
    paths: &VolumePaths,
    volumes_txt_file: P,
    orientation: Orientation,
    steps: &PipelineSteps,
) -> Result<Vec<ProcessedVolume>> {
    let ids = read_volume_list(volumes_txt_file)?;
    preprocess_volumes(codec, paths, ids, orientation, steps)
}

/// 以全部步骤开启的配置加载、预处理 `volumes_txt_file` 中列出的体数据,
/// 并拼接为一个划分的语料.
///
/// 若各体数据的切片 (H, W) 不一致, 返回 `Err(Error::ShapeMismatch)`.
pub fn convert_to_corpus<C: VolumeCodec, P: AsRef<Path>>(
    codec: &C,
    paths: &VolumePaths,
    volumes_txt_file: P,
    remap: RemapConfig,
    orientation: Orientation,
) -> Result<Corpus> {
    let volumes = load_and_preprocess(
        codec,
        paths,
        volumes_txt_file,
        orientation,
        &PipelineSteps::all(remap),
    )?;
    let corpus = Corpus::concat(&volumes)?;
    info!(
        "{} 个体数据拼接为 {} 个切片",
        volumes.len(),
        corpus.len()
    );
    Ok(corpus)
}
