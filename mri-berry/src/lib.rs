#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 把 MRI 脑部扫描及其 FreeSurfer 分割标注整理为
//! 可供 2D 分割网络训练的切片语料, 并提供训练期的数据访问与指标记录.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 目前主要负责处理 OASIS 组织方式的数据
//!   (`<data_dir>/<V>/mri/orig.mgz` 与 `<label_dir>/<V>_glm.mgz`),
//!   其它源的数据按同样方式组织也可以工作.
//! 2. 数据准备是离线批处理任务, 任一体数据出错都会中止整个语料构建,
//!   错误以 [`Error`] 返回而不是 panic.
//!
//! # 处理流程
//!
//! ### 体数据读取 ✅
//!
//! 读取 `.mgz` / `.mgh` 与 `.nii` / `.nii.gz` 文件.
//!
//! 实现位于 `mri-berry/src/data`.
//!
//! ### 预处理 ✅
//!
//! 强度归一化, 方向归一化, 去除首尾全背景切片, 标签重映射,
//! 去除全背景切片, 中值频率平衡 (MFB) 类别权重.
//!
//! 实现位于 `mri-berry/src/preprocess`.
//!
//! ### 语料构建与持久化 ✅
//!
//! 按卷 ID 列表逐个加载、预处理, 沿切片轴拼接, 写入 8 个 `.npz` 归档.
//! 写入先落到 `.part` 临时文件, 成功后再重命名.
//!
//! 实现位于 `mri-berry/src/dataset`.
//!
//! ### 训练期数据集 ✅
//!
//! 按索引访问 `(图像, 标签, 权重)` 三元组.
//!
//! 实现位于 `mri-berry/src/dataset/imdb.rs`.
//!
//! ### 指标记录 ✅
//!
//! Dice 混淆矩阵、逐类 Dice、损失曲线与样本面板.
//!
//! 实现位于 `mri-berry/src/metrics`.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D MRI 体数据基础数据结构.
mod data;

pub use data::{FileCodec, ImgWriteVis, LabelSlice, MriData3d, MriLabel, MriScan, VolumeCodec};

pub use data::mgh;

pub mod consts;

pub mod dataset;

pub mod error;

pub use error::{Error, Result};

pub mod metrics;

pub mod preprocess;

pub mod prelude;
