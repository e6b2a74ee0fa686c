// 该文件是 Shouyu （手语） 项目的一部分。
// src/landmark.rs - 手部关键点
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

use image::RgbImage;
use thiserror::Error;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme};

/// 每只手的关键点数量
pub const HAND_LANDMARK_COUNT: usize = 21;

/// 手部关键点编号
///
/// - **CMC**: 拇指腕掌关节
/// - **MCP**: 掌指关节（指根）
/// - **PIP** / **DIP**: 近端 / 远端指间关节
/// - **Tip**: 指尖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
  Wrist,
  ThumbCmc,
  ThumbMcp,
  ThumbIp,
  ThumbTip,
  IndexFingerMcp,
  IndexFingerPip,
  IndexFingerDip,
  IndexFingerTip,
  MiddleFingerMcp,
  MiddleFingerPip,
  MiddleFingerDip,
  MiddleFingerTip,
  RingFingerMcp,
  RingFingerPip,
  RingFingerDip,
  RingFingerTip,
  PinkyMcp,
  PinkyPip,
  PinkyDip,
  PinkyTip,
}

/// 归一化坐标下的关键点，`(x, y)` 通常位于 `[0, 1]`，检测器也可能给出略超出画面的值
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
  pub x: f32,
  pub y: f32,
}

impl Landmark {
  pub fn new(x: f32, y: f32) -> Self {
    Self { x, y }
  }

  /// 换算为像素坐标，向零取整
  pub fn to_pixel(self, width: u32, height: u32) -> (i64, i64) {
    (
      (self.x * width as f32) as i64,
      (self.y * height as f32) as i64,
    )
  }
}

/// 一只手的 21 个有序关键点
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
  points: [Landmark; HAND_LANDMARK_COUNT],
}

impl LandmarkSet {
  pub fn new(points: [Landmark; HAND_LANDMARK_COUNT]) -> Self {
    Self { points }
  }

  /// 数量不是 21 时返回 `None`
  pub fn from_slice(points: &[Landmark]) -> Option<Self> {
    let points: [Landmark; HAND_LANDMARK_COUNT] = points.try_into().ok()?;
    Some(Self { points })
  }

  pub fn get(&self, idx: LandmarkIdx) -> Landmark {
    self.points[idx as usize]
  }

  pub fn points(&self) -> &[Landmark] {
    &self.points
  }
}

pub trait LandmarkDetector {
  type Error;

  /// 返回画面中检测到的每只手的关键点，可能为空
  fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, Self::Error>;
}

mod hand_network;
mod replay;

pub use self::hand_network::HandLandmarkNetwork;
pub use self::replay::ReplayLandmarks;

#[derive(Error, Debug)]
pub enum LandmarkError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("关键点模型错误: {0}")]
  Network(String),
  #[error("关键点回放第 {line} 行格式错误: {reason}")]
  Replay { line: usize, reason: String },
}

pub enum DetectorWrapper {
  Network(HandLandmarkNetwork),
  Replay(ReplayLandmarks),
}

impl FromUrl for DetectorWrapper {
  type Error = LandmarkError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      HandLandmarkNetwork::SCHEME => Ok(DetectorWrapper::Network(HandLandmarkNetwork::from_url(
        url,
      )?)),
      ReplayLandmarks::SCHEME => Ok(DetectorWrapper::Replay(ReplayLandmarks::from_url(url)?)),
      other => Err(LandmarkError::SchemeMismatch(format!(
        "不支持的关键点来源 '{}'",
        other
      ))),
    }
  }
}

impl LandmarkDetector for DetectorWrapper {
  type Error = LandmarkError;

  fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, Self::Error> {
    match self {
      DetectorWrapper::Network(network) => network.detect(frame),
      DetectorWrapper::Replay(replay) => replay.detect(frame),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anchor_index_is_middle_finger_mcp() {
    assert_eq!(LandmarkIdx::MiddleFingerMcp as usize, 9);
    assert_eq!(LandmarkIdx::PinkyTip as usize, HAND_LANDMARK_COUNT - 1);
  }

  #[test]
  fn landmark_set_requires_21_points() {
    assert!(LandmarkSet::from_slice(&[Landmark::default(); 20]).is_none());
    let mut points = [Landmark::default(); HAND_LANDMARK_COUNT];
    points[9] = Landmark::new(0.25, 0.75);
    let set = LandmarkSet::from_slice(&points).unwrap();
    assert_eq!(set.get(LandmarkIdx::MiddleFingerMcp), Landmark::new(0.25, 0.75));
  }

  #[test]
  fn pixel_conversion_truncates() {
    assert_eq!(Landmark::new(0.5, 0.999).to_pixel(641, 480), (320, 479));
    assert_eq!(Landmark::new(-0.01, 1.2).to_pixel(100, 100), (-1, 120));
  }
}
