//! 对 `mri-berry::dataset` 的更一层封装. 提供默认的数据目录.

use mri_berry::dataset::{self, VolumePaths};
use std::env;
use std::path::PathBuf;

/// 扫描根目录的环境变量.
pub const DATA_DIR_ENV: &str = "MRI_DATA_DIR";

/// 标注目录的环境变量.
pub const LABEL_DIR_ENV: &str = "MRI_LABEL_DIR";

fn env_or_home(key: &str, rest: &[&str]) -> Option<PathBuf> {
    match env::var(key) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(rest),
    }
}

/// 获取扫描根目录.
///
/// 1. 若环境变量 `$MRI_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/FS`. 无法确定主目录时返回 `None`.
pub fn data_dir_from_env_or_home() -> Option<PathBuf> {
    env_or_home(DATA_DIR_ENV, &["FS"])
}

/// 获取标注目录.
///
/// 1. 若环境变量 `$MRI_LABEL_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/labels`. 无法确定主目录时返回 `None`.
pub fn label_dir_from_env_or_home() -> Option<PathBuf> {
    env_or_home(LABEL_DIR_ENV, &["labels"])
}

/// 以显式给出的目录为准, 缺省时回落到环境变量或主目录.
pub fn volume_paths(data_dir: Option<PathBuf>, label_dir: Option<PathBuf>) -> Option<VolumePaths> {
    let data_dir = data_dir.or_else(data_dir_from_env_or_home)?;
    let label_dir = label_dir.or_else(label_dir_from_env_or_home)?;
    Some(VolumePaths::new(data_dir, label_dir))
}
