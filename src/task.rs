// 该文件是 Shouyu （手语） 项目的一部分。
// src/task.rs - 识别主循环
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};
use std::{thread, time::Duration, time::Instant};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::{
  input::CameraSource,
  label::DisplayedLabel,
  landmark::LandmarkDetector,
  model::{ClassProbability, ClassifierInput, Model, Prediction, preprocess, registry},
  output::{Overlay, Render},
  roi::{self, Roi},
  stabilizer::LabelStabilizer,
  telemetry::{FpsMeter, FrameStats},
};

/// 收到中断后等待主循环退出的最长时间
const FORCE_EXIT_AFTER: Duration = Duration::from_secs(30);

/// 协作式取消标志，主循环在每帧渲染之后检查一次
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
  flag: Arc<AtomicBool>,
}

impl CancelSignal {
  pub fn new() -> Self {
    Self::default()
  }

  /// 安装 Ctrl-C 处理器；主循环 30 秒内没有退出则强制结束进程
  pub fn install_ctrlc() -> Result<Self, ctrlc::Error> {
    let signal = Self::new();
    let handler_signal = signal.clone();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      handler_signal.cancel();
      thread::spawn(|| {
        thread::sleep(FORCE_EXIT_AFTER);
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    Ok(signal)
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }
}

pub trait Task<C, D, M, O>: Sized {
  type Error;
  fn run_task(self, camera: C, detector: D, model: M, output: O) -> Result<(), Self::Error>;
}

/// 单帧处理的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
  pub roi: Option<Roi>,
  pub prediction: Option<Prediction>,
  pub displayed: DisplayedLabel,
  pub fps: u32,
}

/// 逐帧识别：取帧、关键点、ROI、分类、稳定、渲染
pub struct RecognitionTask {
  stabilizer: LabelStabilizer,
  fps: FpsMeter,
  stats: FrameStats,
  input_size: (u32, u32),
  frame_number: Option<usize>,
  cancel: CancelSignal,
}

impl Default for RecognitionTask {
  fn default() -> Self {
    Self {
      stabilizer: LabelStabilizer::new(),
      fps: FpsMeter::new(),
      stats: FrameStats::new(),
      input_size: registry::INPUT_RESOLUTION,
      frame_number: None,
      cancel: CancelSignal::new(),
    }
  }
}

impl RecognitionTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn with_stabilizer(mut self, stabilizer: LabelStabilizer) -> Self {
    self.stabilizer = stabilizer;
    self
  }

  pub fn with_input_size(mut self, width: u32, height: u32) -> Self {
    self.input_size = (width, height);
    self
  }

  pub fn stabilizer(&self) -> &LabelStabilizer {
    &self.stabilizer
  }

  /// 处理一帧
  ///
  /// 取帧失败时直接返回错误，本帧不渲染。没有手时不分类，也不改变稳定器状态。
  pub fn step<C, D, M, O>(
    &mut self,
    camera: &mut C,
    detector: &mut D,
    model: &M,
    output: &O,
  ) -> anyhow::Result<StepReport>
  where
    C: CameraSource,
    C::Error: std::error::Error + Send + Sync + 'static,
    D: LandmarkDetector,
    D::Error: std::error::Error + Send + Sync + 'static,
    M: Model<Input = ClassifierInput, Output = ClassProbability>,
    M::Error: std::error::Error + Send + Sync + 'static,
    O: Render<RgbImage>,
    O::Error: std::error::Error + Send + Sync + 'static,
  {
    let frame = camera.read()?;
    let (width, height) = frame.dimensions();

    let hands = detector.detect(&frame)?;
    let roi = roi::extract(&hands, width, height);
    self.stats.record_frame(roi.is_some());

    let mut crop = None;
    let mut prediction = None;
    if let Some(roi) = roi {
      let cropped = preprocess::crop(&frame, &roi);
      let input = preprocess::normalize(&cropped, self.input_size.0, self.input_size.1);

      let start = Instant::now();
      let probs = model.infer(&input)?;
      self.stats.record_inference(start.elapsed());

      let top1 = probs.top1();
      self.stabilizer.observe(top1);
      prediction = Some(top1);
      crop = Some(cropped);
    }
    let displayed = self.stabilizer.displayed();

    let fps = self.fps.tick() as u32;
    debug!(
      "ROI: {:?}, 预测: {:?}, 显示: {}, FPS: {}",
      roi, prediction, displayed, fps
    );

    let overlay = Overlay {
      fps,
      label: displayed,
      score: prediction.map(|p| p.score),
      roi,
      crop: crop.as_ref(),
    };
    output.render_result(&frame, &overlay)?;
    self.stats.flush();

    Ok(StepReport {
      roi,
      prediction,
      displayed,
      fps,
    })
  }
}

impl<C, D, M, O> Task<C, D, M, O> for RecognitionTask
where
  C: CameraSource,
  C::Error: std::error::Error + Send + Sync + 'static,
  D: LandmarkDetector,
  D::Error: std::error::Error + Send + Sync + 'static,
  M: Model<Input = ClassifierInput, Output = ClassProbability>,
  M::Error: std::error::Error + Send + Sync + 'static,
  O: Render<RgbImage>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Error = anyhow::Error;

  fn run_task(
    mut self,
    mut camera: C,
    mut detector: D,
    model: M,
    output: O,
  ) -> Result<(), Self::Error> {
    info!("开始识别...");

    let mut frame_index = 0usize;
    loop {
      self.step(&mut camera, &mut detector, &model, &output)?;
      frame_index += 1;

      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出识别循环", frame_index);
        break;
      }
      if self.cancel.is_cancelled() {
        warn!("中断信号接收，退出识别循环");
        break;
      }
    }

    info!("识别结束, 共处理 {} 帧", frame_index);
    Ok(())
  }
}
