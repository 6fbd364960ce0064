//! 指标记录后端.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 指标记录后端. 每个训练阶段 (train / val) 各持有一个.
pub trait MetricsSink {
    /// 记录标量.
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()>;

    /// 记录图像.
    fn add_figure(&mut self, tag: &str, figure: &RgbImage, step: u64) -> Result<()>;

    /// 记录一段文本.
    fn add_text(&mut self, tag: &str, text: &str, step: u64) -> Result<()>;

    /// 刷新并关闭.
    fn close(&mut self) -> Result<()>;
}

/// `scalars.jsonl` 中的一行.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// 标签, 例如 `loss/per_epoch`.
    pub tag: String,
    /// 标量值.
    pub value: f64,
    /// 迭代数或 epoch.
    pub step: u64,
}

/// `texts.jsonl` 中的一行.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRecord {
    /// 标签.
    pub tag: String,
    /// 文本内容.
    pub text: String,
    /// 迭代数或 epoch.
    pub step: u64,
}

/// 基于目录的记录后端.
///
/// ```text
/// <run_dir>/scalars.jsonl
/// <run_dir>/texts.jsonl
/// <run_dir>/figures/<tag>/<step>.png
/// ```
///
/// JSON 文件以追加方式打开, 同一目录可以跨多次运行续写.
pub struct JsonSink {
    run_dir: PathBuf,
    scalars: BufWriter<File>,
    texts: BufWriter<File>,
}

impl JsonSink {
    /// 标量记录文件名.
    pub const SCALARS: &'static str = "scalars.jsonl";
    /// 文本记录文件名.
    pub const TEXTS: &'static str = "texts.jsonl";
    /// 图像目录名.
    pub const FIGURES: &'static str = "figures";

    /// 在 `run_dir` 下打开 (必要时创建) 记录文件.
    pub fn new(run_dir: impl Into<PathBuf>) -> Result<Self> {
        let run_dir = run_dir.into();
        fs::create_dir_all(&run_dir).map_err(|e| Error::io(&run_dir, e))?;
        let scalars = open_append(&run_dir.join(Self::SCALARS))?;
        let texts = open_append(&run_dir.join(Self::TEXTS))?;
        Ok(Self {
            run_dir,
            scalars,
            texts,
        })
    }

    /// 记录目录.
    #[inline]
    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// 标签为 `tag`, 步数为 `step` 的图像路径.
    pub fn figure_path(&self, tag: &str, step: u64) -> PathBuf {
        self.run_dir
            .join(Self::FIGURES)
            .join(tag)
            .join(format!("{step}.png"))
    }
}

fn open_append(path: &Path) -> Result<BufWriter<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|e| Error::io(path, e))
}

fn write_line<T: Serialize>(out: &mut BufWriter<File>, path: &Path, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n").map_err(|e| Error::io(path, e))
}

impl MetricsSink for JsonSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        let record = ScalarRecord {
            tag: tag.to_owned(),
            value,
            step,
        };
        write_line(&mut self.scalars, &self.run_dir.join(Self::SCALARS), &record)
    }

    fn add_figure(&mut self, tag: &str, figure: &RgbImage, step: u64) -> Result<()> {
        let path = self.figure_path(tag, step);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        figure.save(&path)?;
        Ok(())
    }

    fn add_text(&mut self, tag: &str, text: &str, step: u64) -> Result<()> {
        let record = TextRecord {
            tag: tag.to_owned(),
            text: text.to_owned(),
            step,
        };
        write_line(&mut self.texts, &self.run_dir.join(Self::TEXTS), &record)
    }

    fn close(&mut self) -> Result<()> {
        self.scalars
            .flush()
            .map_err(|e| Error::io(self.run_dir.join(Self::SCALARS), e))?;
        self.texts
            .flush()
            .map_err(|e| Error::io(self.run_dir.join(Self::TEXTS), e))
    }
}
