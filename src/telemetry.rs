// 该文件是 Shouyu （手语） 项目的一部分。
// src/telemetry.rs - 帧率与统计
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

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;

/// 瞬时帧率，取相邻两次 `tick` 的时间差
#[derive(Debug, Default)]
pub struct FpsMeter {
  last: Option<Instant>,
}

impl FpsMeter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn tick(&mut self) -> f32 {
    self.tick_at(Instant::now())
  }

  /// 第一次调用或时间差为零时返回 0
  pub fn tick_at(&mut self, now: Instant) -> f32 {
    let fps = match self.last {
      Some(last) => {
        let delta = now.saturating_duration_since(last).as_secs_f32();
        if delta > 0.0 { 1.0 / delta } else { 0.0 }
      }
      None => 0.0,
    };
    self.last = Some(now);
    fps
  }
}

/// 一个统计窗口的汇总
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
  pub frames: u32,
  pub hand_frames: u32,
  pub classifications: u32,
  pub mean_inference_ms: f32,
}

impl fmt::Display for StatsSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} 帧, {} 帧有手, {} 次分类, 平均推理 {:.1}ms",
      self.frames, self.hand_frames, self.classifications, self.mean_inference_ms
    )
  }
}

/// 按秒聚合的帧统计，每满一个窗口输出一条 debug 日志后清零
#[derive(Debug)]
pub struct FrameStats {
  window: Duration,
  start: Instant,
  frames: u32,
  hand_frames: u32,
  inference: Vec<Duration>,
}

impl Default for FrameStats {
  fn default() -> Self {
    Self::new()
  }
}

impl FrameStats {
  pub fn new() -> Self {
    Self::with_window(Duration::from_secs(1), Instant::now())
  }

  pub fn with_window(window: Duration, start: Instant) -> Self {
    Self {
      window,
      start,
      frames: 0,
      hand_frames: 0,
      inference: Vec::new(),
    }
  }

  pub fn record_frame(&mut self, has_hand: bool) {
    self.frames += 1;
    if has_hand {
      self.hand_frames += 1;
    }
  }

  pub fn record_inference(&mut self, elapsed: Duration) {
    self.inference.push(elapsed);
  }

  pub fn summary(&self) -> StatsSummary {
    let classifications = self.inference.len() as u32;
    let mean_inference_ms = if self.inference.is_empty() {
      0.0
    } else {
      let total: Duration = self.inference.iter().sum();
      total.as_secs_f32() * 1000.0 / classifications as f32
    };
    StatsSummary {
      frames: self.frames,
      hand_frames: self.hand_frames,
      classifications,
      mean_inference_ms,
    }
  }

  /// 窗口已满时返回汇总并开启新窗口
  pub fn flush_at(&mut self, now: Instant) -> Option<StatsSummary> {
    if now.saturating_duration_since(self.start) < self.window {
      return None;
    }
    let summary = self.summary();
    debug!("{}", summary);
    self.start = now;
    self.frames = 0;
    self.hand_frames = 0;
    self.inference.clear();
    Some(summary)
  }

  pub fn flush(&mut self) -> Option<StatsSummary> {
    self.flush_at(Instant::now())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_relative_eq;

  #[test]
  fn first_tick_is_zero() {
    let mut meter = FpsMeter::new();
    assert_eq!(meter.tick_at(Instant::now()), 0.0);
  }

  #[test]
  fn fps_is_inverse_of_delta() {
    let mut meter = FpsMeter::new();
    let t0 = Instant::now();
    meter.tick_at(t0);
    assert_relative_eq!(meter.tick_at(t0 + Duration::from_millis(40)), 25.0, epsilon = 1e-3);
    assert_relative_eq!(meter.tick_at(t0 + Duration::from_millis(140)), 10.0, epsilon = 1e-3);
  }

  #[test]
  fn zero_delta_is_zero() {
    let mut meter = FpsMeter::new();
    let t0 = Instant::now();
    meter.tick_at(t0);
    assert_eq!(meter.tick_at(t0), 0.0);
  }

  #[test]
  fn stats_flush_once_per_window() {
    let t0 = Instant::now();
    let mut stats = FrameStats::with_window(Duration::from_secs(1), t0);
    stats.record_frame(true);
    stats.record_inference(Duration::from_millis(10));
    stats.record_frame(false);
    stats.record_frame(true);
    stats.record_inference(Duration::from_millis(30));

    assert!(stats.flush_at(t0 + Duration::from_millis(500)).is_none());

    let summary = stats.flush_at(t0 + Duration::from_secs(1)).unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(summary.hand_frames, 2);
    assert_eq!(summary.classifications, 2);
    assert_relative_eq!(summary.mean_inference_ms, 20.0, epsilon = 1e-3);

    assert_eq!(stats.summary().frames, 0);
    assert_eq!(stats.summary().mean_inference_ms, 0.0);
  }
}
