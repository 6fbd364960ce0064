//! 分割训练过程的指标: Dice 评估、跨批次累加、渲染与记录.
//!
//! 训练循环每个批次调用一次 `update_*`, 每个 epoch 调用一次 `*_per_epoch`.
//! 刷新会清空累加器, 不是幂等操作.

mod accumulator;
pub mod evaluator;
pub mod render;
mod sink;
mod writer;

pub use accumulator::{Accumulator, ConfusionAccumulator, DiceAccumulator, Drained};
pub use evaluator::{argmax_classes, dice_confusion_matrix, dice_score_perclass};
pub use sink::{JsonSink, MetricsSink, ScalarRecord, TextRecord};
pub use writer::{beautify_labels, LogWriter, Phase};
