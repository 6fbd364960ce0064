//! FreeSurfer MGH/MGZ 体数据读取.
//!
//! MGH 文件由 284 字节的大端序 header 和紧随其后的体素数据组成,
//! 体素按 `x` 最快、`frame` 最慢的顺序排列. MGZ 是整个文件的 gzip 压缩.
//! 这里只读取第一帧.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteordered::ByteOrdered;
use flate2::read::GzDecoder;
use ndarray::Array3;

use crate::error::{Error, Result};

/// header 之后数据的起始字节.
const DATA_START: usize = 284;

const MGH_VERSION: i32 = 1;

const MRI_UCHAR: i32 = 0;
const MRI_INT: i32 = 1;
const MRI_FLOAT: i32 = 3;
const MRI_SHORT: i32 = 4;

/// 判断文件名是否以 `.mgz` 或 `.gz` 结尾.
pub fn is_compressed<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .map(|a| {
            let name = a.to_string_lossy();
            name.ends_with(".mgz") || name.ends_with(".gz")
        })
        .unwrap_or(false)
}

/// 读取 MGH 或 MGZ 文件的第一帧, 以 `f32` 返回.
///
/// 返回的数组按 `[x, y, z]` 索引, 与文件中的维度顺序一致.
pub fn read_mgh<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut raw = Vec::new();
    let read = if is_compressed(path) {
        GzDecoder::new(BufReader::new(file)).read_to_end(&mut raw)
    } else {
        BufReader::new(file).read_to_end(&mut raw)
    };
    read.map_err(|e| Error::io(path, e))?;

    decode(&raw).map_err(|reason| Error::Mgh {
        path: path.to_owned(),
        reason,
    })
}

/// header 中用到的字段.
struct Header {
    dims: [usize; 3],
    dtype: i32,
}

impl Header {
    /// 从字节流开头读取 header, 并校验版本号与维度.
    fn from_reader<R: Read>(input: R) -> std::result::Result<Self, String> {
        let mut input = ByteOrdered::be(input);
        let eof = |e: std::io::Error| format!("header 读取失败: {e}");

        let version = input.read_i32().map_err(eof)?;
        if version != MGH_VERSION {
            return Err(format!("不支持的 MGH 版本 {version}"));
        }
        let mut dims = [0; 3];
        for len in dims.iter_mut() {
            let v = input.read_i32().map_err(eof)?;
            if v <= 0 {
                return Err(format!("非法的体数据维度 {v}"));
            }
            *len = v as usize;
        }
        let _frames = input.read_i32().map_err(eof)?;
        let dtype = input.read_i32().map_err(eof)?;
        Ok(Self { dims, dtype })
    }

    /// 第一帧的体素个数, 溢出时返回 `None`.
    fn num_voxels(&self) -> Option<usize> {
        let [w, h, d] = self.dims;
        w.checked_mul(h)?.checked_mul(d)
    }
}

/// 解码未压缩的 MGH 字节流.
fn decode(raw: &[u8]) -> std::result::Result<Array3<f32>, String> {
    if raw.len() < DATA_START {
        return Err(format!("文件长度 {} 小于 header 长度", raw.len()));
    }
    let header = Header::from_reader(raw)?;
    let [w, h, d] = header.dims;

    let elem = match header.dtype {
        MRI_UCHAR => 1,
        MRI_SHORT => 2,
        MRI_INT | MRI_FLOAT => 4,
        other => return Err(format!("不支持的体素类型 {other}")),
    };
    let n = header
        .num_voxels()
        .ok_or_else(|| format!("体数据维度 ({w}, {h}, {d}) 溢出"))?;
    let end = n
        .checked_mul(elem)
        .and_then(|bytes| bytes.checked_add(DATA_START))
        .ok_or_else(|| format!("体数据维度 ({w}, {h}, {d}) 溢出"))?;
    if raw.len() < end {
        return Err(format!("体素数据不足, 需要 {} 字节", end - DATA_START));
    }

    let mut body = ByteOrdered::be(&raw[DATA_START..end]);
    let truncated = |e: std::io::Error| format!("体素读取失败: {e}");
    let mut voxels = Vec::with_capacity(n);
    for _ in 0..n {
        let v = match header.dtype {
            MRI_UCHAR => body.read_u8().map(f32::from),
            MRI_SHORT => body.read_i16().map(f32::from),
            MRI_INT => body.read_i32().map(|v| v as f32),
            _ => body.read_f32(),
        };
        voxels.push(v.map_err(truncated)?);
    }

    // 文件中 x 变化最快: 以 [z, y, x] 行优先装载, 再翻转为 [x, y, z].
    let data = Array3::from_shape_vec((d, h, w), voxels)
        .map_err(|e| e.to_string())?
        .permuted_axes([2, 1, 0]);
    Ok(data.as_standard_layout().into_owned())
}

/// 测试辅助: 编码一个单帧 `MRI_FLOAT` MGH 字节流. `data` 按 `[x, y, z]` 索引.
#[cfg(test)]
pub(crate) fn encode_float(data: &Array3<f32>) -> Vec<u8> {
    let (w, h, d) = data.dim();
    let mut buf = Vec::with_capacity(DATA_START + 4 * data.len());
    for v in [MGH_VERSION, w as i32, h as i32, d as i32, 1, MRI_FLOAT, 0] {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    buf.resize(DATA_START, 0);
    for z in 0..d {
        for y in 0..h {
            for x in 0..w {
                buf.extend_from_slice(&data[(x, y, z)].to_be_bytes());
            }
        }
    }
    buf
}
