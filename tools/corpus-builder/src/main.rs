//! 把 MRI 体数据整理为训练/测试切片语料, 并写入 8 个 `.npz` 归档.

mod result;
mod runner;

use clap::Parser;
use log::{error, LevelFilter};
use mri_berry::preprocess::{Orientation, RemapConfig};
use mri_berry::FileCodec;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use crate::runner::Job;

/// 命令行参数. 方向与重映射配置在解析阶段校验, 早于任何文件读写.
#[derive(Parser, Debug)]
#[command(name = "corpus-builder", version, about)]
struct Args {
    /// 扫描根目录, 其下为 `<V>/mri/orig.mgz`. 缺省时读取 `$MRI_DATA_DIR`, 再缺省为 `$HOME/dataset/FS`.
    #[arg(long = "data-dir", short = 'd')]
    data_dir: Option<PathBuf>,
    /// 标注目录, 其下为 `<V>_glm.mgz`. 缺省时读取 `$MRI_LABEL_DIR`, 再缺省为 `$HOME/dataset/labels`.
    #[arg(long = "label-dir", short = 'l')]
    label_dir: Option<PathBuf>,
    /// 训练集体数据 ID 列表文件, 每行一个 ID.
    #[arg(long = "train-volumes", short = 'r')]
    train_volumes: PathBuf,
    /// 测试集体数据 ID 列表文件, 每行一个 ID.
    #[arg(long = "test-volumes", short = 't')]
    test_volumes: PathBuf,
    /// 标签重映射配置: FS 或 Neo.
    #[arg(long = "remap-config", short = 'c', value_parser = parse_token::<RemapConfig>)]
    remap_config: RemapConfig,
    /// 切片方向: COR, AXI 或 SAG.
    #[arg(long, short = 'o', value_parser = parse_token::<Orientation>)]
    orientation: Orientation,
    /// 输出目录, 不存在时创建.
    #[arg(long = "destination-folder", short = 'f', default_value = ".")]
    destination_folder: PathBuf,
    /// 日志级别.
    #[arg(long = "log-level", default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

/// 以库中的 `FromStr` 解析配置标识, 错误信息原样交给 clap.
fn parse_token<T: FromStr<Err = mri_berry::Error>>(s: &str) -> Result<T, String> {
    s.parse().map_err(|e: mri_berry::Error| e.to_string())
}

impl Args {
    /// 补全数据目录. 无法确定主目录时返回 `None`.
    fn into_job(self) -> Option<Job> {
        let paths = utils::loader::volume_paths(self.data_dir, self.label_dir)?;
        Some(Job {
            paths,
            train_volumes: self.train_volumes,
            test_volumes: self.test_volumes,
            remap: self.remap_config,
            orientation: self.orientation,
            destination: self.destination_folder,
        })
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(args.log_level)
        .init()
    {
        eprintln!("初始化日志失败: {e}");
    }

    let Some(job) = args.into_job() else {
        eprintln!("无法确定数据目录, 请通过 --data-dir 与 --label-dir 指定");
        return ExitCode::FAILURE;
    };

    println!("{}", utils::banner("Start"));
    match runner::run(&FileCodec, &job) {
        Ok(result) => {
            result.analyze();
            println!("{}", utils::banner("Finish"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:?}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
