//! 切片方向归一化.

use std::fmt;
use std::str::FromStr;

use crate::data::MriData3d;
use crate::error::Error;

/// 切片方向. 决定沿哪个解剖轴切出 2D 切片.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Orientation {
    /// 冠状面, 标识 `COR`.
    Coronal,

    /// 横断面, 标识 `AXI`.
    Axial,

    /// 矢状面, 标识 `SAG`.
    Sagittal,
}

impl Orientation {
    /// 全部方向.
    pub const ALL: [Orientation; 3] = [Self::Coronal, Self::Axial, Self::Sagittal];

    /// 命令行与配置中使用的标识.
    #[inline]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Coronal => "COR",
            Self::Axial => "AXI",
            Self::Sagittal => "SAG",
        }
    }

    /// 作用于 `[d1, d2, d3]` 体数据的坐标轴排列.
    #[inline]
    pub const fn axes(self) -> [usize; 3] {
        match self {
            Self::Coronal => [2, 0, 1],
            Self::Axial => [1, 2, 0],
            Self::Sagittal => [0, 1, 2],
        }
    }

    /// 能撤销本方向排列的方向.
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Coronal => Self::Axial,
            Self::Axial => Self::Coronal,
            Self::Sagittal => Self::Sagittal,
        }
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|o| o.token() == s)
            .ok_or_else(|| Error::UnknownOrientation(s.to_owned()))
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// 重排扫描与标注的坐标轴, 使切片轴成为第 0 轴.
///
/// 只改变形状, 不改变体素个数与内容.
#[inline]
pub fn rotate_orientation(data: MriData3d, orientation: Orientation) -> MriData3d {
    data.permuted_axes(orientation.axes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MriLabel, MriScan};
    use ndarray::Array3;

    fn sample() -> MriData3d {
        let scan = Array3::from_shape_fn((2, 3, 4), |(a, b, c)| (a * 100 + b * 10 + c) as f32);
        let label = scan.mapv(|v| v as u16);
        MriData3d::new(MriScan::from(scan), MriLabel::from(label)).unwrap()
    }

    #[test]
    fn test_tokens() {
        for o in Orientation::ALL {
            assert_eq!(o.token().parse::<Orientation>().unwrap(), o);
        }
        let err = "cor".parse::<Orientation>().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_slice_axis_first() {
        assert_eq!(rotate_orientation(sample(), Orientation::Coronal).shape(), (4, 2, 3));
        assert_eq!(rotate_orientation(sample(), Orientation::Axial).shape(), (3, 4, 2));
        assert_eq!(rotate_orientation(sample(), Orientation::Sagittal).shape(), (2, 3, 4));

        // 冠状面的第 k 个切片是原数组第三维为 k 的截面.
        let cor = rotate_orientation(sample(), Orientation::Coronal);
        assert_eq!(cor.scan()[(3, 1, 2)], 123.0);
        assert_eq!(cor.label()[(3, 1, 2)], 123);
    }

    #[test]
    fn test_inverse_round_trip() {
        for o in Orientation::ALL {
            let back = rotate_orientation(rotate_orientation(sample(), o), o.inverse());
            assert_eq!(back, sample());
        }
    }
}
