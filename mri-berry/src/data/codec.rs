//! 体数据编解码. 把磁盘上的扫描/标注文件读成稠密 3D 数组.

use std::path::Path;

use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

use super::{mgh, MriData3d, MriLabel, MriScan};
use crate::error::{Error, Result};

/// 从磁盘加载一对 (扫描, 标注) 体数据.
///
/// 返回的数组按文件中的维度顺序 `[d1, d2, d3]` 索引, 尚未做方向归一化.
pub trait VolumeCodec {
    /// 加载 `scan_path` 处的扫描与 `label_path` 处的标注.
    fn load_pair(&self, scan_path: &Path, label_path: &Path) -> Result<MriData3d>;
}

/// 基于文件扩展名分派的编解码器.
///
/// `.mgz` / `.mgh` 按 FreeSurfer MGH 读取, 其余按 nifti (`.nii`, `.nii.gz`) 读取.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileCodec;

impl FileCodec {
    /// 以 `f32` 读取任意支持格式的 3D 体数据.
    pub fn read_f32(path: &Path) -> Result<Array3<f32>> {
        if is_mgh(path) {
            mgh::read_mgh(path)
        } else {
            read_nifti(path)
        }
    }
}

impl VolumeCodec for FileCodec {
    fn load_pair(&self, scan_path: &Path, label_path: &Path) -> Result<MriData3d> {
        let scan = MriScan::from(Self::read_f32(scan_path)?);
        let label = MriLabel::from_f32(&Self::read_f32(label_path)?);
        MriData3d::new(scan, label)
    }
}

/// 判断文件是否为 MGH 格式.
fn is_mgh(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("mgz") | Some("mgh")
    )
}

/// 读取 nifti 文件. 4D 文件只取第一个时间点.
fn read_nifti(path: &Path) -> Result<Array3<f32>> {
    let obj = match ReaderOptions::new().read_file(path) {
        Ok(obj) => obj,
        Err(nifti::NiftiError::Io(e)) => return Err(Error::io(path, e)),
        Err(e) => return Err(e.into()),
    };
    let data = squeeze_trailing(obj.into_volume().into_ndarray::<f32>()?);
    let shape = data.shape().to_vec();
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| Error::ShapeMismatch {
            context: path.display().to_string(),
            expected: vec![0, 0, 0],
            found: shape,
        })?;

    // The nature of nifti data field layout.
    Ok(data.as_standard_layout().into_owned())
}

/// 去掉 3 维之后长度为 1 的尾部轴.
fn squeeze_trailing(mut data: ArrayD<f32>) -> ArrayD<f32> {
    while data.ndim() > 3 && data.len_of(Axis(data.ndim() - 1)) == 1 {
        let last = Axis(data.ndim() - 1);
        data = data.index_axis_move(last, 0);
    }
    data
}
