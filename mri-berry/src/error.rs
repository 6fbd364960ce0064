//! 运行时错误.

use std::path::PathBuf;

use ndarray_npy::{ReadNpzError, WriteNpzError};
use thiserror::Error;

/// 本 crate 的统一结果类型.
pub type Result<T> = std::result::Result<T, Error>;

/// 数据准备、语料持久化与数据集访问过程中的错误.
///
/// 所有错误都不会被自动重试: 数据准备是离线批处理任务,
/// 任一体数据失败都应中止整个语料构建.
#[derive(Debug, Error)]
pub enum Error {
    /// 未知的切片方向标识. 合法值为 `COR`, `AXI`, `SAG`.
    #[error("未知的切片方向 `{0}`, 合法值为 COR, AXI, SAG")]
    UnknownOrientation(String),

    /// 未知的标签重映射配置. 合法值为 `FS`, `Neo`.
    #[error("未知的标签重映射配置 `{0}`, 合法值为 FS, Neo")]
    UnknownRemapConfig(String),

    /// 底层文件 I/O 错误.
    #[error("读写 `{path}` 失败: {source}")]
    Io {
        /// 出错的文件路径.
        path: PathBuf,
        /// 底层错误.
        source: std::io::Error,
    },

    /// nifti 文件解析错误.
    #[error("nifti 解析失败: {0}")]
    Nifti(#[from] nifti::NiftiError),

    /// MGH/MGZ 文件格式错误.
    #[error("MGH 文件 `{path}` 格式错误: {reason}")]
    Mgh {
        /// 出错的文件路径.
        path: PathBuf,
        /// 具体原因.
        reason: String,
    },

    /// 形状不一致. 例如扫描与标注形状不同, 或同一划分中切片的 (H, W) 不同.
    #[error("形状不一致 ({context}): 期望 {expected:?}, 实际 {found:?}")]
    ShapeMismatch {
        /// 出错位置的描述 (通常为体数据 ID).
        context: String,
        /// 期望的形状.
        expected: Vec<usize>,
        /// 实际的形状.
        found: Vec<usize>,
    },

    /// 拼接语料时体数据缺少类别权重 (未启用权重估计).
    #[error("体数据 `{0}` 缺少类别权重")]
    MissingWeights(String),

    /// 数据集索引越界.
    #[error("索引 {index} 越界, 数据集长度为 {len}")]
    IndexOutOfRange {
        /// 请求的索引.
        index: usize,
        /// 数据集长度.
        len: usize,
    },

    /// 读取 npz 归档错误.
    #[error("读取 npz 归档失败: {0}")]
    ReadNpz(#[from] ReadNpzError),

    /// 写入 npz 归档错误.
    #[error("写入 npz 归档失败: {0}")]
    WriteNpz(#[from] WriteNpzError),

    /// 指标图像保存错误.
    #[error("保存指标图像失败: {0}")]
    Image(#[from] image::ImageError),

    /// 指标记录序列化错误.
    #[error("序列化指标记录失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 将 `std::io::Error` 与出错路径绑定.
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否为配置错误 (未知方向或未知重映射配置).
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownOrientation(_) | Self::UnknownRemapConfig(_))
    }
}
