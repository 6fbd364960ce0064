//! 训练过程的指标记录器.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{info, warn};
use ndarray::{Array2, ArrayView2, ArrayView3, ArrayView4};

use super::accumulator::{ConfusionAccumulator, DiceAccumulator};
use super::evaluator::{argmax_classes, dice_confusion_matrix, dice_score_perclass};
use super::render::{confusion_heatmap, dice_bars, dice_box_plot, sample_panel};
use super::sink::{JsonSink, MetricsSink};
use crate::consts::label::{CLASS_NAMES, NUM_CLASS};
use crate::error::{Error, Result};

/// 标签换行宽度.
const LABEL_WRAP: usize = 40;

/// 训练阶段.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 训练.
    Train,
    /// 验证.
    Val,
}

impl Phase {
    /// 全部阶段.
    pub const ALL: [Phase; 2] = [Phase::Train, Phase::Val];

    /// 阶段名, 同时也是记录子目录名.
    pub const fn token(self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Val => "val",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// 指标记录器. 每个阶段一个记录后端, 混淆矩阵与 Dice 按批次累加, 按 epoch 刷新.
///
/// 刷新会清空累加器: 同一 epoch 内第二次刷新只能看到全 0 与 0 个批次.
pub struct LogWriter<S> {
    num_class: usize,
    train: S,
    val: S,
    labels: Vec<String>,
    cm_train: ConfusionAccumulator,
    cm_val: ConfusionAccumulator,
    dice: DiceAccumulator,
}

impl LogWriter<JsonSink> {
    /// 在 `log_dir/exp_name/{train,val}` 下创建记录器.
    ///
    /// 除非 `use_last_checkpoint`, 已有的记录目录会被删除.
    /// `labels` 缺省时, 33 类使用内置类别名, 其余使用类别序号.
    pub fn create<P: AsRef<Path>>(
        num_class: usize,
        log_dir: P,
        exp_name: &str,
        use_last_checkpoint: bool,
        labels: Option<&[&str]>,
    ) -> Result<Self> {
        let root = log_dir.as_ref().join(exp_name);
        let open = |phase: Phase| -> Result<JsonSink> {
            let run_dir = root.join(phase.token());
            if !use_last_checkpoint && run_dir.exists() {
                info!("删除旧的记录目录 {}", run_dir.display());
                fs::remove_dir_all(&run_dir).map_err(|e| Error::io(&run_dir, e))?;
            }
            JsonSink::new(run_dir)
        };
        let train = open(Phase::Train)?;
        let val = open(Phase::Val)?;
        Self::with_sinks(num_class, train, val, labels)
    }
}

impl<S: MetricsSink> LogWriter<S> {
    /// 使用给定的记录后端构造. 美化后的类别名会作为文本记录写入训练后端.
    pub fn with_sinks(num_class: usize, train: S, val: S, labels: Option<&[&str]>) -> Result<Self> {
        let raw: Vec<String> = match labels {
            Some(labels) => labels.iter().map(|s| s.to_string()).collect(),
            None if num_class == NUM_CLASS => CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            None => (0..num_class).map(|c| c.to_string()).collect(),
        };
        if raw.len() != num_class {
            warn!("类别名个数 {} 与类别数 {num_class} 不一致", raw.len());
        }
        let mut writer = Self {
            num_class,
            train,
            val,
            labels: beautify_labels(&raw),
            cm_train: ConfusionAccumulator::new(num_class),
            cm_val: ConfusionAccumulator::new(num_class),
            dice: DiceAccumulator::new(num_class),
        };
        let text = writer.labels.join("\n\n");
        writer.train.add_text("class_labels", &text, 0)?;
        Ok(writer)
    }

    /// 类别数.
    #[inline]
    pub fn num_class(&self) -> usize {
        self.num_class
    }

    /// 美化后的类别名.
    #[inline]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// 阶段对应的记录后端.
    #[inline]
    pub fn sink(&self, phase: Phase) -> &S {
        match phase {
            Phase::Train => &self.train,
            Phase::Val => &self.val,
        }
    }

    fn sink_mut(&mut self, phase: Phase) -> &mut S {
        match phase {
            Phase::Train => &mut self.train,
            Phase::Val => &mut self.val,
        }
    }

    fn cm_mut(&mut self, phase: Phase) -> &mut ConfusionAccumulator {
        match phase {
            Phase::Train => &mut self.cm_train,
            Phase::Val => &mut self.cm_val,
        }
    }

    /// 记录一次迭代的训练损失.
    pub fn loss_per_iter(
        &mut self,
        loss: f64,
        i_batch: usize,
        current_iteration: u64,
    ) -> Result<()> {
        info!("train : [iteration : {i_batch}] : {loss}");
        self.train
            .add_scalar("loss/per_iteration", loss, current_iteration)
    }

    /// 记录一个 epoch 的损失: 训练阶段取最后一个值, 验证阶段取平均值.
    pub fn loss_per_epoch(&mut self, losses: &[f64], phase: Phase, epoch: u64) -> Result<()> {
        let Some(&last) = losses.last() else {
            warn!("{phase} epoch {epoch} 没有损失记录");
            return Ok(());
        };
        let loss = match phase {
            Phase::Train => last,
            Phase::Val => losses.iter().sum::<f64>() / losses.len() as f64,
        };
        info!("{phase} : [epoch : {epoch}] : loss {loss}");
        self.sink_mut(phase).add_scalar("loss/per_epoch", loss, epoch)
    }

    /// 以一个批次的 `(N, C, H, W)` 预测得分和 `(N, H, W)` 真值更新混淆矩阵.
    pub fn update_cm_per_iter(
        &mut self,
        predictions: ArrayView4<'_, f32>,
        labels: ArrayView3<'_, u16>,
        phase: Phase,
    ) -> Result<()> {
        check_batch(&predictions, &labels)?;
        let output = argmax_classes(predictions);
        let (_, cm) = dice_confusion_matrix(output.view(), labels, self.num_class);
        self.cm_mut(phase).update(cm.view());
        Ok(())
    }

    /// 刷新 `phase` 的混淆矩阵: 按批次平均, 渲染热力图并清零. 返回平均矩阵.
    pub fn cm_per_epoch(&mut self, phase: Phase, epoch: u64) -> Result<Array2<f64>> {
        let drained = self.cm_mut(phase).drain();
        let cm = drained.mean();
        info!("{phase} : [epoch : {epoch}] : 混淆矩阵 ({} 个批次)", drained.batches);
        let figure = confusion_heatmap(cm.view());
        self.sink_mut(phase)
            .add_figure(&format!("confusion_matrix/{phase}"), &figure, epoch)?;
        Ok(cm)
    }

    /// 以一个批次的预测与真值更新逐类 Dice.
    pub fn update_dice_score_per_iteration(
        &mut self,
        predictions: ArrayView4<'_, f32>,
        labels: ArrayView3<'_, u16>,
    ) -> Result<()> {
        check_batch(&predictions, &labels)?;
        let output = argmax_classes(predictions);
        let ds = dice_score_perclass(output.view(), labels, self.num_class);
        self.dice.update(ds.view());
        Ok(())
    }

    /// 刷新逐类 Dice: 按批次平均, 渲染柱状图并清零. 返回各类 Dice 的平均值.
    pub fn dice_score_per_epoch(&mut self, epoch: u64) -> Result<f64> {
        let ds = self.dice.drain().mean();
        let mean = ds.mean().unwrap_or(0.0);
        info!("val : [epoch : {epoch}] : 平均 Dice {mean:.4}");
        self.val.add_scalar("dice_score/mean", mean, epoch)?;
        self.val
            .add_figure("dice_score_per_epoch", &dice_bars(ds.view()), epoch)?;
        Ok(mean)
    }

    /// 在验证后端记录逐类 Dice 箱线图, `title` 作为同名文本记录.
    ///
    /// `class_dist` 每行为一个样本, 列数必须等于类别数.
    pub fn plot_eval_box_plot(
        &mut self,
        caption: &str,
        class_dist: ArrayView2<'_, f64>,
        title: &str,
    ) -> Result<()> {
        if class_dist.ncols() != self.num_class {
            return Err(Error::ShapeMismatch {
                context: "箱线图".to_owned(),
                expected: vec![class_dist.nrows(), self.num_class],
                found: class_dist.shape().to_vec(),
            });
        }
        self.val.add_figure(caption, &dice_box_plot(class_dist), 0)?;
        self.val.add_text(caption, title, 0)
    }

    /// 记录预测与真值的样本面板.
    pub fn image_per_epoch(
        &mut self,
        prediction: ArrayView3<'_, u16>,
        ground_truth: ArrayView3<'_, u16>,
        phase: Phase,
        epoch: u64,
    ) -> Result<()> {
        if prediction.shape() != ground_truth.shape() {
            return Err(Error::ShapeMismatch {
                context: "样本面板".to_owned(),
                expected: ground_truth.shape().to_vec(),
                found: prediction.shape().to_vec(),
            });
        }
        let panel = sample_panel(prediction, ground_truth, self.num_class);
        self.sink_mut(phase)
            .add_figure(&format!("sample_prediction/{phase}"), &panel, epoch)
    }

    /// 刷新并关闭两个记录后端.
    pub fn close(mut self) -> Result<()> {
        self.train.close()?;
        self.val.close()
    }
}

/// 检查预测 `(N, C, H, W)` 与真值 `(N, H, W)` 的 `N, H, W` 是否一致.
fn check_batch(predictions: &ArrayView4<'_, f32>, labels: &ArrayView3<'_, u16>) -> Result<()> {
    let (n, _, h, w) = predictions.dim();
    if (n, h, w) != labels.dim() {
        let (a, b, c) = labels.dim();
        return Err(Error::ShapeMismatch {
            context: "预测与真值".to_owned(),
            expected: vec![a, b, c],
            found: vec![n, h, w],
        });
    }
    Ok(())
}

/// 在驼峰命名的单词边界插入空格.
///
/// `"LeftCerebralWM"` -> `"Left Cerebral WM"`.
fn split_camel_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        out.push(c);
        let next = chars.get(i + 1).copied();
        let after = chars.get(i + 2).copied();
        let boundary = match next {
            Some(n) if c.is_lowercase() && n.is_uppercase() => true,
            Some(n) if c.is_uppercase() && n.is_uppercase() => {
                after.map_or(false, char::is_lowercase)
            }
            _ => false,
        };
        if boundary {
            out.push(' ');
        }
    }
    out
}

/// 按单词贪心换行, 每行不超过 `width` 个字符. 超长单词会被硬切分.
fn wrap(s: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in s.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        if line.is_empty() {
            line = word;
        } else if line.chars().count() + 1 + word.chars().count() <= width {
            line.push(' ');
            line.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut line, word));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines.join("\n")
}

/// 美化类别名: 拆分驼峰单词, 并在 40 个字符处换行.
pub fn beautify_labels<S: AsRef<str>>(labels: &[S]) -> Vec<String> {
    labels
        .iter()
        .map(|l| wrap(&split_camel_case(l.as_ref()), LABEL_WRAP))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use ndarray::{Array3, Array4};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Scalar(String, f64, u64),
        Figure(String, (u32, u32), u64),
        Text(String, u64),
        Closed,
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<Event>,
    }

    impl MetricsSink for RecordingSink {
        fn add_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
            self.events.push(Event::Scalar(tag.to_owned(), value, step));
            Ok(())
        }

        fn add_figure(&mut self, tag: &str, figure: &RgbImage, step: u64) -> Result<()> {
            self.events
                .push(Event::Figure(tag.to_owned(), figure.dimensions(), step));
            Ok(())
        }

        fn add_text(&mut self, tag: &str, _text: &str, step: u64) -> Result<()> {
            self.events.push(Event::Text(tag.to_owned(), step));
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.events.push(Event::Closed);
            Ok(())
        }
    }

    fn writer(num_class: usize) -> LogWriter<RecordingSink> {
        LogWriter::with_sinks(
            num_class,
            RecordingSink::default(),
            RecordingSink::default(),
            None,
        )
        .unwrap()
    }

    /// 预测得分: 每个像素在 `labels` 对应类别上得分最高.
    fn one_hot(labels: &Array3<u16>, num_class: usize) -> Array4<f32> {
        let (n, h, w) = labels.dim();
        Array4::from_shape_fn((n, num_class, h, w), |(i, c, y, x)| {
            if labels[(i, y, x)] as usize == c {
                1.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_beautify_labels() {
        let out = beautify_labels(&["LeftCerebralWM", "CSF", "Background"]);
        assert_eq!(out, ["Left Cerebral WM", "CSF", "Background"]);

        let long = "AVeryLongLabelNameThatKeepsGoingAndGoingForeverAndEver";
        for line in beautify_labels(&[long])[0].lines() {
            assert!(line.chars().count() <= LABEL_WRAP);
        }
    }

    #[test]
    fn test_default_labels() {
        let w = writer(NUM_CLASS);
        assert_eq!(w.labels().len(), NUM_CLASS);
        assert_eq!(w.sink(Phase::Train).events, [Event::Text("class_labels".into(), 0)]);

        let w = writer(3);
        assert_eq!(w.labels(), ["0", "1", "2"]);
    }

    #[test]
    fn test_cm_flush_averages_and_resets() {
        let mut w = writer(2);
        let labels = Array3::from_shape_fn((1, 2, 2), |(_, y, _)| y as u16);
        let logits = one_hot(&labels, 2);
        for _ in 0..3 {
            w.update_cm_per_iter(logits.view(), labels.view(), Phase::Val)
                .unwrap();
        }
        let cm = w.cm_per_epoch(Phase::Val, 1).unwrap();
        assert!((cm[(0, 0)] - 1.0).abs() < 1e-4);
        assert_eq!(cm[(0, 1)], 0.0);
        assert_eq!(
            w.sink(Phase::Val).events.last(),
            Some(&Event::Figure("confusion_matrix/val".into(), (24, 24), 1))
        );

        // 第二次刷新只能看到全 0.
        let cm = w.cm_per_epoch(Phase::Val, 1).unwrap();
        assert!(cm.iter().all(|v| *v == 0.0));
        // 训练阶段的累加器不受影响.
        assert!(w.cm_per_epoch(Phase::Train, 1).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_dice_flush() {
        let mut w = writer(3);
        let labels = Array3::from_shape_fn((2, 2, 2), |(i, _, _)| i as u16);
        let logits = one_hot(&labels, 3);
        w.update_dice_score_per_iteration(logits.view(), labels.view())
            .unwrap();
        let mean = w.dice_score_per_epoch(4).unwrap();
        // 类别 2 缺席, 得分为 0.
        assert!((mean - 2.0 / 3.0).abs() < 1e-4);
        assert!(matches!(
            &w.sink(Phase::Val).events[0],
            Event::Scalar(tag, _, 4) if tag == "dice_score/mean"
        ));
    }

    #[test]
    fn test_box_plot() {
        let mut w = writer(3);
        let dist = Array2::from_shape_fn((4, 3), |(i, c)| (i + c) as f64 / 6.0);
        w.plot_eval_box_plot("eval/box_plot", dist.view(), "Dice 分布")
            .unwrap();
        let events = &w.sink(Phase::Val).events;
        assert_eq!(
            events[events.len() - 2..],
            [
                Event::Figure("eval/box_plot".into(), (3 * 12 + 2, 120), 0),
                Event::Text("eval/box_plot".into(), 0),
            ]
        );

        let narrow = Array2::<f64>::zeros((4, 2));
        assert!(matches!(
            w.plot_eval_box_plot("eval/box_plot", narrow.view(), ""),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_batch_shape_checked() {
        let mut w = writer(2);
        let logits = Array4::<f32>::zeros((1, 2, 3, 3));
        let labels = Array3::<u16>::zeros((1, 3, 2));
        assert!(matches!(
            w.update_cm_per_iter(logits.view(), labels.view(), Phase::Train),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(w
            .image_per_epoch(labels.view(), Array3::zeros((1, 3, 3)).view(), Phase::Val, 0)
            .is_err());
    }

    #[test]
    fn test_losses() {
        let mut w = writer(2);
        w.loss_per_iter(0.9, 0, 10).unwrap();
        w.loss_per_epoch(&[1.0, 3.0], Phase::Train, 1).unwrap();
        w.loss_per_epoch(&[1.0, 3.0], Phase::Val, 1).unwrap();
        w.loss_per_epoch(&[], Phase::Val, 2).unwrap();
        assert_eq!(
            w.sink(Phase::Train).events[1..],
            [
                Event::Scalar("loss/per_iteration".into(), 0.9, 10),
                Event::Scalar("loss/per_epoch".into(), 3.0, 1),
            ]
        );
        assert_eq!(
            w.sink(Phase::Val).events,
            [Event::Scalar("loss/per_epoch".into(), 2.0, 1)]
        );
    }

    #[test]
    fn test_create_clears_old_runs() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("exp/train/stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let w = LogWriter::create(2, dir.path(), "exp", true, Some(&["Bg", "Fg"][..])).unwrap();
        w.close().unwrap();
        assert!(stale.exists());

        let mut w = LogWriter::create(2, dir.path(), "exp", false, None).unwrap();
        assert!(!stale.exists());
        let pred = Array3::<u16>::zeros((1, 2, 2));
        w.image_per_epoch(pred.view(), pred.view(), Phase::Val, 3).unwrap();
        w.close().unwrap();
        assert!(dir
            .path()
            .join("exp/val/figures/sample_prediction/val/3.png")
            .exists());
    }
}
