// 该文件是 Shouyu （手语） 项目的一部分。
// src/stabilizer.rs - 标签稳定器
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

//! 把逐帧的分类结果变成稳定的显示标签。
//!
//! 单帧高置信度结果立即显示；低置信度帧只累加计数，连续超过
//! [`DEFAULT_MAX_MISS_STREAK`] 帧后才回到空闲符号 `#`。没有检测到手的帧不参与计数。

use tracing::debug;

use crate::{label::DisplayedLabel, model::Prediction};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.9;
pub const DEFAULT_MAX_MISS_STREAK: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilizerState {
  pub displayed: DisplayedLabel,
  pub miss_streak: u32,
}

#[derive(Debug, Clone)]
pub struct LabelStabilizer {
  state: StabilizerState,
  threshold: f32,
  max_miss_streak: u32,
}

impl Default for LabelStabilizer {
  fn default() -> Self {
    Self::new()
  }
}

impl LabelStabilizer {
  pub fn new() -> Self {
    Self {
      state: StabilizerState::default(),
      threshold: DEFAULT_CONFIDENCE_THRESHOLD,
      max_miss_streak: DEFAULT_MAX_MISS_STREAK,
    }
  }

  pub fn with_threshold(mut self, threshold: f32) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn with_max_miss_streak(mut self, max_miss_streak: u32) -> Self {
    self.max_miss_streak = max_miss_streak;
    self
  }

  /// 输入一帧的分类结果，返回更新后的显示标签
  pub fn observe(&mut self, prediction: Prediction) -> DisplayedLabel {
    if prediction.score >= self.threshold {
      self.state.displayed = DisplayedLabel::Letter(prediction.label);
      self.state.miss_streak = 0;
    } else {
      self.state.miss_streak += 1;
      if self.state.miss_streak > self.max_miss_streak {
        debug!("连续 {} 帧低置信度，回到空闲状态", self.state.miss_streak);
        self.state.displayed = DisplayedLabel::Idle;
        self.state.miss_streak = 0;
      }
    }
    self.state.displayed
  }

  pub fn displayed(&self) -> DisplayedLabel {
    self.state.displayed
  }

  pub fn miss_streak(&self) -> u32 {
    self.state.miss_streak
  }

  pub fn state(&self) -> StabilizerState {
    self.state
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::label::Letter;

  fn pred(label: Letter, score: f32) -> Prediction {
    Prediction { label, score }
  }

  #[test]
  fn starts_idle() {
    let stabilizer = LabelStabilizer::new();
    assert_eq!(stabilizer.state(), StabilizerState::default());
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Idle);
  }

  #[test]
  fn confident_frame_shows_immediately() {
    let mut stabilizer = LabelStabilizer::new();
    assert_eq!(
      stabilizer.observe(pred(Letter::A, 0.95)),
      DisplayedLabel::Letter(Letter::A)
    );
    assert_eq!(stabilizer.miss_streak(), 0);
  }

  #[test]
  fn holds_for_ten_misses_then_resets_on_eleventh() {
    let mut stabilizer = LabelStabilizer::new();
    stabilizer.observe(pred(Letter::A, 0.95));

    for expected in 1..=10 {
      assert_eq!(
        stabilizer.observe(pred(Letter::B, 0.2)),
        DisplayedLabel::Letter(Letter::A)
      );
      assert_eq!(stabilizer.miss_streak(), expected);
    }

    assert_eq!(stabilizer.observe(pred(Letter::B, 0.2)), DisplayedLabel::Idle);
    assert_eq!(stabilizer.miss_streak(), 0);
  }

  #[test]
  fn confident_frame_clears_streak() {
    let mut stabilizer = LabelStabilizer::new();
    for _ in 0..7 {
      stabilizer.observe(pred(Letter::C, 0.5));
    }
    assert_eq!(stabilizer.miss_streak(), 7);
    stabilizer.observe(pred(Letter::L, 0.91));
    assert_eq!(stabilizer.miss_streak(), 0);
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Letter(Letter::L));
  }

  #[test]
  fn threshold_is_inclusive() {
    let mut stabilizer = LabelStabilizer::new();
    stabilizer.observe(pred(Letter::V, DEFAULT_CONFIDENCE_THRESHOLD));
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Letter(Letter::V));
  }

  #[test]
  fn nan_score_counts_as_miss() {
    let mut stabilizer = LabelStabilizer::new();
    stabilizer.observe(pred(Letter::V, f32::NAN));
    assert_eq!(stabilizer.miss_streak(), 1);
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Idle);
  }

  #[test]
  fn custom_limits_apply() {
    let mut stabilizer = LabelStabilizer::new()
      .with_threshold(0.5)
      .with_max_miss_streak(1);
    stabilizer.observe(pred(Letter::Y, 0.6));
    stabilizer.observe(pred(Letter::Y, 0.1));
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Letter(Letter::Y));
    stabilizer.observe(pred(Letter::Y, 0.1));
    assert_eq!(stabilizer.displayed(), DisplayedLabel::Idle);
  }
}
