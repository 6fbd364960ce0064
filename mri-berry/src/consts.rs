//! 通用常量.

/// 标签相关常量.
pub mod label {
    /// 规范类别空间中, 背景的标签值.
    pub const BACKGROUND: u16 = 0;

    /// 规范类别空间的类别数 (含背景).
    pub const NUM_CLASS: usize = 33;

    /// `FS` (FreeSurfer aseg) 标签表. 第 `i` 项的原始标签会被映射为 `i + 1`.
    pub const FS_LABELS: [u16; NUM_CLASS - 1] = [
        2, 3, 4, 5, 7, 8, 10, 11, 12, 13, 14, 15, 16, 17, 18, 24, 26, 28, 41, 42, 43, 44, 46, 47,
        49, 50, 51, 52, 53, 54, 58, 60,
    ];

    /// `Neo` (Neuromorphometrics) 标签表. 第 `i` 项的原始标签会被映射为 `i + 1`.
    ///
    /// 查表前, 所有 `>= 100` 的皮层标签先按奇偶折叠为
    /// [`NEO_CORTEX_ODD`] 或 [`NEO_CORTEX_EVEN`].
    pub const NEO_LABELS: [u16; NUM_CLASS - 1] = [
        45, 211, 52, 50, 41, 39, 60, 37, 58, 56, 4, 11, 35, 48, 32, 46, 30, 62, 44, 210, 51, 49,
        40, 38, 59, 36, 57, 55, 47, 31, 23, 61,
    ];

    /// `Neo` 皮层标签的起始值.
    pub const NEO_CORTEX_START: u16 = 100;

    /// 偶数皮层标签折叠后的值 (右半球).
    pub const NEO_CORTEX_EVEN: u16 = 210;

    /// 奇数皮层标签折叠后的值 (左半球).
    pub const NEO_CORTEX_ODD: u16 = 211;

    /// 规范类别名称, 按类别 ID 排列. 驼峰式, 由指标图表负责美化.
    pub const CLASS_NAMES: [&str; NUM_CLASS] = [
        "Background",
        "LeftWM",
        "LeftCortex",
        "LeftLateralVentricle",
        "LeftInfLatVentricle",
        "LeftCerebellumWM",
        "LeftCerebellumCortex",
        "LeftThalamus",
        "LeftCaudate",
        "LeftPutamen",
        "LeftPallidum",
        "3rdVentricle",
        "4thVentricle",
        "Brainstem",
        "LeftHippocampus",
        "LeftAmygdala",
        "CSF",
        "LeftAccumbens",
        "LeftVentralDC",
        "RightWM",
        "RightCortex",
        "RightLateralVentricle",
        "RightInfLatVentricle",
        "RightCerebellumWM",
        "RightCerebellumCortex",
        "RightThalamus",
        "RightCaudate",
        "RightPutamen",
        "RightPallidum",
        "RightHippocampus",
        "RightAmygdala",
        "RightAccumbens",
        "RightVentralDC",
    ];

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u16) -> bool {
        p == BACKGROUND
    }

    /// 像素是否是前景?
    #[inline]
    pub const fn is_foreground(p: u16) -> bool {
        !is_background(p)
    }
}

/// 文件布局相关常量.
pub mod layout {
    /// 每个体数据目录下, 扫描文件的相对路径.
    pub const SCAN_RELATIVE: [&str; 2] = ["mri", "orig.mgz"];

    /// 标注文件名后缀. 完整文件名为 `{volume_id}{LABEL_SUFFIX}`.
    pub const LABEL_SUFFIX: &str = "_glm.mgz";

    /// 持久化数组名的前缀. 完整数组名为 `{ARRAY_PREFIX}_{field}_{split}`.
    pub const ARRAY_PREFIX: &str = "OASIS";
}
