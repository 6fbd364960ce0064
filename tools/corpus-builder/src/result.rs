//! 语料构建结果.

use mri_berry::dataset::{Corpus, Split};
use std::io::{self, Write};
use std::path::PathBuf;

/// 一个划分的语料概况.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSummary {
    pub split: Split,
    pub slices: usize,
    pub slice_shape: (usize, usize),
    pub class_weights: usize,
}

impl SplitSummary {
    pub fn new(split: Split, corpus: &Corpus) -> Self {
        let (slices, h, w) = corpus.data().dim();
        Self {
            split,
            slices,
            slice_shape: (h, w),
            class_weights: corpus.class_weights().len(),
        }
    }
}

/// 将 `s` 的概况写进 `w` 中.
fn describe_into<W: Write>(s: &SplitSummary, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Split `{}`:", s.split)?;
    writeln!(w, "{S4}Slices: {}", s.slices)?;
    writeln!(w, "{S4}Slice shape: {:?}", s.slice_shape)?;
    write!(w, "{S4}Class weights: {}", s.class_weights)?;
    Ok(())
}

/// 语料构建最终结果.
pub struct BuildResult {
    destination: PathBuf,
    data: Vec<SplitSummary>,
}

impl BuildResult {
    pub fn from_iter<I: IntoIterator<Item = SplitSummary>>(destination: PathBuf, it: I) -> Self {
        Self {
            destination,
            data: it.into_iter().collect(),
        }
    }

    /// 各划分的概况.
    #[inline]
    pub fn summaries(&self) -> &[SplitSummary] {
        &self.data
    }

    /// 打印运行结果.
    pub fn analyze(&self) {
        utils::sep();
        println!("Corpus written to `{}`", self.destination.display());
        utils::sep();
        let mut buf = Vec::with_capacity(256);

        for summary in self.data.iter() {
            if describe_into(summary, &mut buf).is_ok() {
                println!("{}", String::from_utf8_lossy(&buf));
            }
            buf.clear();

            utils::sep();
        }
    }
}
