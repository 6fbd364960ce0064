//! 语料的持久化存储.
//!
//! 每个划分写出四个 npz 归档, 每个归档只含一个数组:
//!
//! | 归档                     | 数组名                            |
//! |--------------------------|-----------------------------------|
//! | `Data_{split}.npz`       | `OASIS_data_{split}.npy`          |
//! | `Label_{split}.npz`      | `OASIS_label_{split}.npy`         |
//! | `Class_Weight_{split}.npz` | `OASIS_class_weights_{split}.npy` |
//! | `Weight_{split}.npz`     | `OASIS_weights_{split}.npy`       |

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::{ArrayBase, Data, Dimension, Ix1, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter, WritableElement};

use super::corpus::{Corpus, Split};
use crate::consts::layout::ARRAY_PREFIX;
use crate::error::{Error, Result};

/// 语料中的一个数组字段.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Field {
    /// 扫描切片.
    Data,

    /// 标注切片.
    Label,

    /// 类别权重.
    ClassWeights,

    /// 逐像素权重.
    Weights,
}

impl Field {
    /// 全部字段.
    pub const ALL: [Field; 4] = [Self::Data, Self::Label, Self::ClassWeights, Self::Weights];

    /// 数组名中使用的标识.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Label => "label",
            Self::ClassWeights => "class_weights",
            Self::Weights => "weights",
        }
    }

    /// 归档文件名的主干.
    #[inline]
    const fn file_stem(self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::Label => "Label",
            Self::ClassWeights => "Class_Weight",
            Self::Weights => "Weight",
        }
    }

    /// 归档文件名, 如 `Data_train.npz`.
    #[inline]
    pub fn archive_name(self, split: Split) -> String {
        format!("{}_{split}.npz", self.file_stem())
    }

    /// 归档内的数组名, 如 `OASIS_data_train.npy`.
    #[inline]
    pub fn array_name(self, split: Split) -> String {
        format!("{ARRAY_PREFIX}_{}_{split}.npy", self.token())
    }
}

/// 写入中的归档. 未 [`commit`](PartialFile::commit) 就被丢弃时删除临时文件,
/// 因此最终路径上不会出现被截断的归档.
struct PartialFile {
    part: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(dest: PathBuf) -> Self {
        let mut part = dest.clone().into_os_string();
        part.push(".part");
        Self {
            part: part.into(),
            dest,
            committed: false,
        }
    }

    fn commit(mut self) -> Result<()> {
        fs::rename(&self.part, &self.dest).map_err(|e| Error::io(&self.dest, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.part);
        }
    }
}

/// 将 `array` 写为 `dir` 下 `field` 字段的归档.
fn write_array<S, D>(dir: &Path, field: Field, split: Split, array: &ArrayBase<S, D>) -> Result<()>
where
    S: Data,
    S::Elem: WritableElement,
    D: Dimension,
{
    let guard = PartialFile::new(dir.join(field.archive_name(split)));
    let file = File::create(&guard.part).map_err(|e| Error::io(&guard.part, e))?;
    let mut npz = NpzWriter::new(file);
    npz.add_array(field.array_name(split), array)?;
    // `finish` 返回底层文件, 在 commit 之前将其关闭.
    drop(npz.finish()?);
    guard.commit()
}

/// 将一个划分的语料写入目录 `dir`. 目录必须已存在.
pub fn save_corpus<P: AsRef<Path>>(dir: P, split: Split, corpus: &Corpus) -> Result<()> {
    let dir = dir.as_ref();
    write_array(dir, Field::Data, split, corpus.data())?;
    write_array(dir, Field::Label, split, corpus.label())?;
    write_array(dir, Field::ClassWeights, split, corpus.class_weights())?;
    write_array(dir, Field::Weights, split, corpus.weights())?;
    info!("{split} 语料 ({} 个切片) 已写入 `{}`", corpus.len(), dir.display());
    Ok(())
}

/// 语料归档目录. 负责按字段和划分读取数组.
#[derive(Clone, Debug)]
pub struct NpzArchive {
    dir: PathBuf,
}

impl NpzArchive {
    /// 以 `dir` 为归档目录.
    #[inline]
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// 字段 `field` 在划分 `split` 下的归档路径.
    #[inline]
    pub fn path_of(&self, field: Field, split: Split) -> PathBuf {
        self.dir.join(field.archive_name(split))
    }

    fn read<A, D>(&self, field: Field, split: Split) -> Result<ArrayBase<OwnedRepr<A>, D>>
    where
        A: ndarray_npy::ReadableElement,
        D: Dimension,
    {
        let path = self.path_of(field, split);
        let file = File::open(&path).map_err(|e| Error::io(&path, e))?;
        let mut npz = NpzReader::new(file)?;
        Ok(npz.by_name::<OwnedRepr<A>, D>(&field.array_name(split))?)
    }

    /// 读取扫描切片.
    pub fn data(&self, split: Split) -> Result<ndarray::Array3<f32>> {
        self.read::<f32, Ix3>(Field::Data, split)
    }

    /// 读取标注切片.
    pub fn label(&self, split: Split) -> Result<ndarray::Array3<u16>> {
        self.read::<u16, Ix3>(Field::Label, split)
    }

    /// 读取拼接后的类别权重.
    pub fn class_weights(&self, split: Split) -> Result<ndarray::Array1<f64>> {
        self.read::<f64, Ix1>(Field::ClassWeights, split)
    }

    /// 读取逐像素权重.
    pub fn weights(&self, split: Split) -> Result<ndarray::Array3<f32>> {
        self.read::<f32, Ix3>(Field::Weights, split)
    }

    /// 读取一个划分的完整语料.
    pub fn corpus(&self, split: Split) -> Result<Corpus> {
        Corpus::from_parts(
            self.data(split)?,
            self.label(split)?,
            self.class_weights(split)?,
            self.weights(split)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array3};

    fn corpus() -> Corpus {
        Corpus::from_parts(
            Array3::from_shape_fn((3, 2, 2), |(i, j, k)| (i * 4 + j * 2 + k) as f32 / 12.0),
            Array3::from_shape_fn((3, 2, 2), |(i, _, _)| i as u16),
            Array1::from(vec![0.5, 0.0, 2.0]),
            Array3::from_elem((3, 2, 2), 1.5),
        )
        .unwrap()
    }

    #[test]
    fn test_names() {
        assert_eq!(Field::ClassWeights.archive_name(Split::Train), "Class_Weight_train.npz");
        assert_eq!(Field::Weights.array_name(Split::Test), "OASIS_weights_test.npy");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        save_corpus(dir.path(), Split::Train, &corpus()).unwrap();

        for field in Field::ALL {
            assert!(dir.path().join(field.archive_name(Split::Train)).is_file());
        }
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|x| x == "part"))
            .count();
        assert_eq!(leftovers, 0);

        assert_eq!(NpzArchive::new(dir.path()).corpus(Split::Train).unwrap(), corpus());
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-created");
        assert!(save_corpus(&missing, Split::Test, &corpus()).is_err());
        assert!(!missing.exists());
        assert!(NpzArchive::new(&missing).corpus(Split::Test).is_err());
    }

    #[test]
    fn test_uncommitted_part_removed() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("Data_train.npz");
        {
            let guard = PartialFile::new(dest.clone());
            fs::write(&guard.part, b"half").unwrap();
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
