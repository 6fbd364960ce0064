//! 通用 MRI scan/label 数据加载器.
//!
//! 提供迭代器风格的数据集获取模式.

use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::layout::{LABEL_SUFFIX, SCAN_RELATIVE};
use crate::data::{MriData3d, VolumeCodec};
use crate::error::{Error, Result};

/// 读取体数据 ID 列表文件. 每行一个 ID, 无表头.
///
/// # 注意
///
/// 空行不会被跳过, 它会作为空 ID 保留, 并在加载时报错.
pub fn read_volume_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(text.lines().map(str::to_owned).collect())
}

/// 体数据在磁盘上的布局.
///
/// 对于 ID 为 `V` 的体数据, 扫描位于 `{data_dir}/V/mri/orig.mgz`,
/// 标注位于 `{label_dir}/V_glm.mgz`.
#[derive(Clone, Debug)]
pub struct VolumePaths {
    data_dir: PathBuf,
    label_dir: PathBuf,
}

impl VolumePaths {
    /// 从扫描根目录与标注根目录构造.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(data_dir: P, label_dir: Q) -> Self {
        Self {
            data_dir: data_dir.into(),
            label_dir: label_dir.into(),
        }
    }

    /// 扫描根目录.
    #[inline]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 标注根目录.
    #[inline]
    pub fn label_dir(&self) -> &Path {
        &self.label_dir
    }

    /// ID 为 `id` 的扫描文件路径.
    pub fn scan_path(&self, id: &str) -> PathBuf {
        let mut p = self.data_dir.join(id);
        p.extend(SCAN_RELATIVE);
        p
    }

    /// ID 为 `id` 的标注文件路径.
    pub fn label_path(&self, id: &str) -> PathBuf {
        self.label_dir.join(format!("{id}{LABEL_SUFFIX}"))
    }
}

/// 按 ID 列表顺序依次加载 (扫描, 标注) 的数据加载器.
pub fn data_loader<'a, C: VolumeCodec, I: IntoIterator<Item = String>>(
    codec: &'a C,
    paths: &'a VolumePaths,
    ids: I,
) -> MriDataLoader<'a, C> {
    let mut data: Vec<String> = ids.into_iter().collect();
    data.reverse();

    MriDataLoader {
        codec,
        paths,
        data_rev: data,
    }
}

/// 3D MRI 数据集 (scan + label) 加载器, 并在内部自动转换文件名.
#[derive(Debug)]
pub struct MriDataLoader<'a, C> {
    codec: &'a C,
    paths: &'a VolumePaths,
    data_rev: Vec<String>,
}

impl<C: VolumeCodec> Iterator for MriDataLoader<'_, C> {
    type Item = (String, Result<MriData3d>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.data_rev.pop()?;
        let data = self
            .codec
            .load_pair(&self.paths.scan_path(&id), &self.paths.label_path(&id));
        Some((id, data))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.data_rev.len(), Some(self.data_rev.len()))
    }
}

impl<C: VolumeCodec> ExactSizeIterator for MriDataLoader<'_, C> {
    #[inline]
    fn len(&self) -> usize {
        self.data_rev.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_paths_layout() {
        let paths = VolumePaths::new("/data/FS", "/data/labels");
        assert_eq!(
            paths.scan_path("OAS1_0001"),
            PathBuf::from("/data/FS/OAS1_0001/mri/orig.mgz")
        );
        assert_eq!(
            paths.label_path("OAS1_0001"),
            PathBuf::from("/data/labels/OAS1_0001_glm.mgz")
        );
    }

    #[test]
    fn test_read_volume_list_keeps_lines() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "a\n\nb\n").unwrap();
        assert_eq!(read_volume_list(f.path()).unwrap(), ["a", "", "b"]);
        assert!(matches!(
            read_volume_list("/no/such/list.txt"),
            Err(Error::Io { .. })
        ));
    }
}
