//! 程序运行函数.

use crate::result::{BuildResult, SplitSummary};
use log::info;
use mri_berry::dataset::{convert_to_corpus, save_corpus, Corpus, Split, VolumePaths};
use mri_berry::preprocess::{Orientation, RemapConfig};
use mri_berry::{Error, Result, VolumeCodec};
use std::fs;
use std::path::{Path, PathBuf};

/// 一次语料构建任务.
#[derive(Debug, Clone)]
pub struct Job {
    pub paths: VolumePaths,
    pub train_volumes: PathBuf,
    pub test_volumes: PathBuf,
    pub remap: RemapConfig,
    pub orientation: Orientation,
    pub destination: PathBuf,
}

impl Job {
    /// 划分对应的 ID 列表文件.
    fn volumes(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train_volumes,
            Split::Test => &self.test_volumes,
        }
    }
}

/// 划分标题.
fn title(split: Split) -> &'static str {
    match split {
        Split::Train => "Train data",
        Split::Test => "Test data",
    }
}

/// 实际运行.
///
/// 先构建两个划分的语料, 全部成功后再创建输出目录并写入归档.
pub fn run<C: VolumeCodec>(codec: &C, job: &Job) -> Result<BuildResult> {
    let mut corpora: Vec<(Split, Corpus)> = Vec::with_capacity(Split::ALL.len());
    for split in Split::ALL {
        println!("{}", utils::section(title(split)));
        let corpus = convert_to_corpus(
            codec,
            &job.paths,
            job.volumes(split),
            job.remap,
            job.orientation,
        )?;
        corpora.push((split, corpus));
    }

    fs::create_dir_all(&job.destination).map_err(|e| Error::io(&job.destination, e))?;
    info!("写入语料到 `{}`", job.destination.display());
    for (split, corpus) in corpora.iter() {
        save_corpus(&job.destination, *split, corpus)?;
    }

    Ok(BuildResult::from_iter(
        job.destination.clone(),
        corpora
            .iter()
            .map(|(split, corpus)| SplitSummary::new(*split, corpus)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mri_berry::dataset::{Field, NpzArchive};
    use mri_berry::{MriData3d, MriLabel, MriScan};
    use ndarray::Array3;

    /// 对任意路径返回同一个全前景体数据.
    struct ConstCodec;

    impl VolumeCodec for ConstCodec {
        fn load_pair(&self, _: &Path, _: &Path) -> Result<MriData3d> {
            let scan = Array3::from_shape_fn((4, 4, 4), |(a, b, c)| (a + b + c) as f32);
            let scan = MriScan::from(scan);
            let label = MriLabel::from(Array3::from_elem((4, 4, 4), 17u16));
            MriData3d::new(scan, label)
        }
    }

    fn job(dir: &Path) -> Job {
        fs::write(dir.join("train.txt"), "v1\nv2\n").unwrap();
        fs::write(dir.join("test.txt"), "v3\n").unwrap();
        Job {
            paths: VolumePaths::new(dir.join("FS"), dir.join("labels")),
            train_volumes: dir.join("train.txt"),
            test_volumes: dir.join("test.txt"),
            remap: RemapConfig::FreeSurfer,
            orientation: Orientation::Coronal,
            destination: dir.join("out"),
        }
    }

    #[test]
    fn test_run_writes_all_archives() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let result = run(&ConstCodec, &job).unwrap();

        let archive = NpzArchive::new(&job.destination);
        for split in Split::ALL {
            for field in Field::ALL {
                assert!(archive.path_of(field, split).is_file());
            }
        }
        assert_eq!(archive.corpus(Split::Train).unwrap().len(), 8);
        assert_eq!(archive.corpus(Split::Test).unwrap().len(), 4);
        assert_eq!(result.summaries()[0].slices, 8);
    }

    #[test]
    fn test_missing_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut job = job(dir.path());
        job.test_volumes = dir.path().join("absent.txt");

        assert!(matches!(run(&ConstCodec, &job), Err(Error::Io { .. })));
        assert!(!job.destination.exists());
    }
}
