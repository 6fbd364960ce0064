//! 命令行工具依赖的通用组件.

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
#[inline]
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 醒目的阶段标题, 形如 `* Start *`.
#[inline]
pub fn banner(title: &str) -> String {
    format!("* {title} *")
}

/// 划分标题, 形如 `===Train data===`.
#[inline]
pub fn section(title: &str) -> String {
    format!("==={title}===")
}
