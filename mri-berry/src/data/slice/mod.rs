//! MRI 标签切片对象的操作.

mod core;
mod save;

pub use core::LabelSlice;

pub use save::{class_color, ImgWriteVis};
