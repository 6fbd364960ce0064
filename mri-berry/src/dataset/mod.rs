//! 数据集操作: 语料构建、持久化与训练期访问.

use std::path::{Path, PathBuf};

mod builder;
mod corpus;
pub mod generic;
mod imdb;
mod npz_database;

pub use builder::{
    convert_to_corpus, load_and_preprocess, preprocess_volume, preprocess_volumes,
    PipelineSteps, ProcessedVolume,
};
pub use corpus::{Corpus, Split};
pub use generic::{read_volume_list, VolumePaths};
pub use imdb::{get_data, ImdbData, ImdbEntry};
pub use npz_database::{save_corpus, Field, NpzArchive};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
