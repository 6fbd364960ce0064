//! 原始标签 ID 到规范类别 ID 的重映射.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::consts::label::*;
use crate::data::MriLabel;
use crate::error::Error;

/// 标签重映射配置. 选择一张内置的 "原始标签 → 规范类别" 查找表.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum RemapConfig {
    /// FreeSurfer aseg 标签, 标识 `FS`.
    FreeSurfer,

    /// Neuromorphometrics 标签, 标识 `Neo`.
    Neo,
}

static FS_TABLE: Lazy<HashMap<u16, u16>> = Lazy::new(|| build_table(&FS_LABELS));
static NEO_TABLE: Lazy<HashMap<u16, u16>> = Lazy::new(|| build_table(&NEO_LABELS));

fn build_table(raw: &[u16]) -> HashMap<u16, u16> {
    raw.iter()
        .enumerate()
        .map(|(i, &r)| (r, i as u16 + 1))
        .collect()
}

impl RemapConfig {
    /// 命令行与配置中使用的标识.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::FreeSurfer => "FS",
            Self::Neo => "Neo",
        }
    }

    /// 规范类别空间的类别数 (含背景).
    #[inline]
    pub const fn num_class(self) -> usize {
        NUM_CLASS
    }

    /// 规范类别名称, 按类别 ID 排列.
    #[inline]
    pub fn class_names(self) -> &'static [&'static str] {
        &CLASS_NAMES
    }

    fn table(self) -> &'static HashMap<u16, u16> {
        match self {
            Self::FreeSurfer => &FS_TABLE,
            Self::Neo => &NEO_TABLE,
        }
    }

    /// 映射单个原始标签. 表中不存在的标签映射为背景.
    pub fn map(self, raw: u16) -> u16 {
        let raw = match self {
            Self::Neo if raw >= NEO_CORTEX_START => {
                if raw % 2 == 0 {
                    NEO_CORTEX_EVEN
                } else {
                    NEO_CORTEX_ODD
                }
            }
            _ => raw,
        };
        self.table().get(&raw).copied().unwrap_or(BACKGROUND)
    }
}

impl FromStr for RemapConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FS" => Ok(Self::FreeSurfer),
            "Neo" => Ok(Self::Neo),
            other => Err(Error::UnknownRemapConfig(other.to_owned())),
        }
    }
}

impl fmt::Display for RemapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// 按 `config` 将标注中的原始标签重映射到规范类别空间 `[0, num_class)`.
pub fn remap_labels(label: &MriLabel, config: RemapConfig) -> MriLabel {
    label.data().mapv(|raw| config.map(raw)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn label_of(v: Vec<u16>) -> MriLabel {
        Array3::from_shape_vec((1, 1, v.len()), v).unwrap().into()
    }

    fn values(l: &MriLabel) -> Vec<u16> {
        l.data().iter().copied().collect()
    }

    #[test]
    fn test_tokens() {
        assert_eq!("FS".parse::<RemapConfig>().unwrap(), RemapConfig::FreeSurfer);
        assert_eq!("Neo".parse::<RemapConfig>().unwrap(), RemapConfig::Neo);
        assert!("neo".parse::<RemapConfig>().unwrap_err().is_configuration());
    }

    #[test]
    fn test_fs_table() {
        let out = remap_labels(&label_of(vec![0, 2, 3, 60, 6, 1000]), RemapConfig::FreeSurfer);
        assert_eq!(values(&out), [0, 1, 2, 32, 0, 0]);
    }

    #[test]
    fn test_neo_cortex_fold() {
        let out = remap_labels(&label_of(vec![45, 101, 100, 2034, 61, 1]), RemapConfig::Neo);
        // 101 -> 211 (左皮层, 类别 2); 偶数 -> 210 (右皮层, 类别 20).
        assert_eq!(values(&out), [1, 2, 20, 20, 32, 0]);
    }

    #[test]
    fn test_deterministic_and_bounded() {
        let raw = label_of((0..300).collect());
        for config in [RemapConfig::FreeSurfer, RemapConfig::Neo] {
            let a = remap_labels(&raw, config);
            assert_eq!(a, remap_labels(&raw, config));
            assert!(a.data().iter().all(|&c| (c as usize) < config.num_class()));
        }
    }

    #[test]
    fn test_tables_are_injective() {
        assert_eq!(FS_TABLE.len(), NUM_CLASS - 1);
        assert_eq!(NEO_TABLE.len(), NUM_CLASS - 1);
    }
}
