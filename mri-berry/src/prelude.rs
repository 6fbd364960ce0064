//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::slice::{class_color, ImgWriteVis, LabelSlice};
pub use crate::data::{FileCodec, MriData3d, MriLabel, MriScan, VolumeCodec};

pub use crate::consts::label::{BACKGROUND, CLASS_NAMES, NUM_CLASS};

pub use crate::error::{Error, Result};

pub use crate::preprocess::{
    estimate_weights_mfb, reduce_slices, remap_labels, remove_black, rotate_orientation,
    Orientation, RemapConfig,
};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{
    self, convert_to_corpus, get_data, save_corpus, Corpus, ImdbData, PipelineSteps, Split,
    VolumePaths,
};

pub use crate::metrics::{JsonSink, LogWriter, MetricsSink, Phase};
