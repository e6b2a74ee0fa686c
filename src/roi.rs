// 该文件是 Shouyu （手语） 项目的一部分。
// src/roi.rs - 手部感兴趣区域
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

use crate::landmark::{LandmarkIdx, LandmarkSet};

/// 以锚点为中心的半边长（像素）
pub const ROI_MARGIN: i64 = 140;

/// ROI 中心所用的关键点
pub const ANCHOR_LANDMARK: LandmarkIdx = LandmarkIdx::MiddleFingerMcp;

/// 像素坐标下的轴对齐框，满足 `0 <= x0 <= x1 <= w` 与 `0 <= y0 <= y1 <= h`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
  pub x0: u32,
  pub y0: u32,
  pub x1: u32,
  pub y1: u32,
}

impl Roi {
  /// 以 `(cx, cy)` 为中心、边距为 [`ROI_MARGIN`] 的框，两个角分别裁剪到画面内
  pub fn around(cx: i64, cy: i64, width: u32, height: u32) -> Self {
    let (w, h) = (width as i64, height as i64);
    Self {
      x0: cx.saturating_sub(ROI_MARGIN).clamp(0, w) as u32,
      y0: cy.saturating_sub(ROI_MARGIN).clamp(0, h) as u32,
      x1: cx.saturating_add(ROI_MARGIN).clamp(0, w) as u32,
      y1: cy.saturating_add(ROI_MARGIN).clamp(0, h) as u32,
    }
  }

  pub fn width(&self) -> u32 {
    self.x1.saturating_sub(self.x0)
  }

  pub fn height(&self) -> u32 {
    self.y1.saturating_sub(self.y0)
  }

  pub fn is_empty(&self) -> bool {
    self.width() == 0 || self.height() == 0
  }
}

/// 计算本帧的 ROI
///
/// 多只手时以最后一只手的锚点为准，不挑选最大或最可信的手。没有手，
/// 或锚点远在画面外导致框面积为零时返回 `None`。
pub fn extract(hands: &[LandmarkSet], width: u32, height: u32) -> Option<Roi> {
  let anchor = hands.last()?.get(ANCHOR_LANDMARK);
  let (cx, cy) = anchor.to_pixel(width, height);
  let roi = Roi::around(cx, cy, width, height);
  (!roi.is_empty()).then_some(roi)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::landmark::{HAND_LANDMARK_COUNT, Landmark};

  fn hand_at(x: f32, y: f32) -> LandmarkSet {
    let mut points = [Landmark::new(0.0, 0.0); HAND_LANDMARK_COUNT];
    points[ANCHOR_LANDMARK as usize] = Landmark::new(x, y);
    LandmarkSet::new(points)
  }

  #[test]
  fn no_hand_yields_no_roi() {
    assert_eq!(extract(&[], 640, 480), None);
  }

  #[test]
  fn centered_box_is_unclamped() {
    let roi = extract(&[hand_at(0.5, 0.5)], 640, 480).unwrap();
    assert_eq!(
      roi,
      Roi {
        x0: 180,
        y0: 100,
        x1: 460,
        y1: 380
      }
    );
    assert_eq!((roi.width(), roi.height()), (280, 280));
  }

  #[test]
  fn corners_clamp_independently() {
    let roi = extract(&[hand_at(0.05, 0.98)], 640, 480).unwrap();
    assert_eq!(
      roi,
      Roi {
        x0: 0,
        y0: 330,
        x1: 172,
        y1: 480
      }
    );
  }

  #[test]
  fn last_hand_wins() {
    let hands = [hand_at(0.1, 0.1), hand_at(0.9, 0.9)];
    let roi = extract(&hands, 1000, 1000).unwrap();
    assert_eq!((roi.x0, roi.y0), (760, 760));
    assert_eq!((roi.x1, roi.y1), (1000, 1000));
  }

  #[test]
  fn far_outside_anchor_is_dropped() {
    assert_eq!(extract(&[hand_at(3.0, 0.5)], 100, 100), None);
  }

  #[test]
  fn huge_coordinates_do_not_overflow() {
    assert_eq!(extract(&[hand_at(1e30, 0.5)], 640, 480), None);
    assert_eq!(extract(&[hand_at(-1e30, f32::MAX)], 640, 480), None);
    assert_eq!(extract(&[hand_at(f32::INFINITY, 0.5)], 640, 480), None);

    let extremes = [i64::MIN, i64::MIN + 1, -ROI_MARGIN, i64::MAX - 1, i64::MAX];
    for &cx in &extremes {
      for &cy in &extremes {
        let roi = Roi::around(cx, cy, 640, 480);
        assert!(roi.x0 <= roi.x1 && roi.x1 <= 640, "{:?}", roi);
        assert!(roi.y0 <= roi.y1 && roi.y1 <= 480, "{:?}", roi);
      }
    }
  }

  #[test]
  fn clamping_holds_for_random_frames() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..10_000 {
      let w = rng.u32(1..4000);
      let h = rng.u32(1..4000);
      let cx = if rng.bool() { rng.i64(-1000..5000) } else { rng.i64(..) };
      let cy = if rng.bool() { rng.i64(-1000..5000) } else { rng.i64(..) };
      let roi = Roi::around(cx, cy, w, h);
      assert!(roi.x0 <= roi.x1 && roi.x1 <= w, "{:?} in {}x{}", roi, w, h);
      assert!(roi.y0 <= roi.y1 && roi.y1 <= h, "{:?} in {}x{}", roi, w, h);
    }
  }
}
