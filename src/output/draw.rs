// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/draw.rs - 识别结果叠加绘制
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

use std::path::Path;

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::output::Overlay;

pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

// 品红
const OVERLAY_COLOR: [u8; 3] = [255, 0, 255];
const FONT_SIZE: f32 = 40.0;
const TEXT_X: i32 = 10;
// 文字基线的 y 坐标
const FPS_BASELINE: i32 = 70;
const LABEL_BASELINE: i32 = 120;
const SCORE_BASELINE: i32 = 170;
const BOX_THICKNESS: u32 = 2;

pub struct Draw {
  font: Option<FontArc>,
  font_size: f32,
  color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    let font = load_font(Path::new(DEFAULT_FONT_PATH))
      .inspect_err(|e| debug!("默认字体不可用: {}", e))
      .ok();
    Self::with_font(font)
  }
}

fn load_font(path: &Path) -> Result<FontArc, String> {
  let data = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
  FontArc::try_from_vec(data).map_err(|e| format!("{}: {}", path.display(), e))
}

impl Draw {
  pub fn with_font(font: Option<FontArc>) -> Self {
    Self {
      font,
      font_size: FONT_SIZE,
      color: OVERLAY_COLOR,
    }
  }

  /// 从字体文件创建；字体无法加载时只画框，不画文字
  pub fn from_font_path<P: AsRef<Path>>(path: P) -> Self {
    let font = load_font(path.as_ref())
      .inspect_err(|e| warn!("无法加载字体, 将不绘制文字: {}", e))
      .ok();
    Self::with_font(font)
  }

  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 返回叠加了 ROI 框与文字的新图像
  pub fn annotate(&self, frame: &RgbImage, overlay: &Overlay<'_>) -> RgbImage {
    let mut image = frame.clone();
    self.annotate_mut(&mut image, overlay);
    image
  }

  pub fn annotate_mut(&self, image: &mut RgbImage, overlay: &Overlay<'_>) {
    let color = Rgb(self.color);

    if let Some(roi) = overlay.roi.filter(|roi| !roi.is_empty()) {
      for inset in 0..BOX_THICKNESS {
        let (w, h) = (roi.width(), roi.height());
        if w <= 2 * inset || h <= 2 * inset {
          break;
        }
        let rect = Rect::at((roi.x0 + inset) as i32, (roi.y0 + inset) as i32)
          .of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(image, rect, color);
      }
    }

    self.draw_text(image, FPS_BASELINE, &overlay.fps.to_string());
    self.draw_text(image, LABEL_BASELINE, &overlay.label.to_string());
    if let Some(score) = overlay.score {
      self.draw_text(image, SCORE_BASELINE, &format!("{:.4}", score));
    }
  }

  fn draw_text(&self, image: &mut RgbImage, baseline: i32, text: &str) {
    let Some(font) = &self.font else {
      return;
    };
    let scale = PxScale::from(self.font_size);
    let ascent = font.as_scaled(scale).ascent();
    let top = baseline - ascent.round() as i32;
    draw_text_mut(image, Rgb(self.color), TEXT_X, top, scale, font, text);
  }
}

/// 记录每帧识别结果的 `.txt` 旁注文件
pub struct Record;

impl Record {
  /// 格式：`label, score, x0, y0, x1, y1`，没有手时只写标签
  pub fn format(overlay: &Overlay<'_>) -> String {
    match (overlay.roi, overlay.score) {
      (Some(roi), Some(score)) => format!(
        "{}, {:.4}, {}, {}, {}, {}",
        overlay.label,
        score,
        roi.x0,
        roi.y0,
        roi.x1,
        roi.y1
      ),
      _ => overlay.label.to_string(),
    }
  }

  pub fn record(&self, overlay: &Overlay<'_>, path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path.with_extension("txt"), Self::format(overlay))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    label::{DisplayedLabel, Letter},
    roi::Roi,
  };

  fn roi() -> Roi {
    Roi {
      x0: 10,
      y0: 20,
      x1: 50,
      y1: 60,
    }
  }

  #[test]
  fn roi_box_is_two_pixels_thick() {
    let frame = RgbImage::new(100, 100);
    let overlay = Overlay {
      roi: Some(roi()),
      ..Default::default()
    };
    let image = Draw::with_font(None).annotate(&frame, &overlay);

    let magenta = Rgb(OVERLAY_COLOR);
    assert_eq!(*image.get_pixel(10, 30), magenta);
    assert_eq!(*image.get_pixel(11, 30), magenta);
    assert_eq!(*image.get_pixel(12, 30), Rgb([0, 0, 0]));
    assert_eq!(*image.get_pixel(30, 20), magenta);
    assert_eq!(*image.get_pixel(49, 59), magenta);
    assert_eq!(*image.get_pixel(30, 40), Rgb([0, 0, 0]));
  }

  #[test]
  fn frame_without_hand_is_untouched_without_font() {
    let frame = RgbImage::from_pixel(32, 32, Rgb([1, 2, 3]));
    let image = Draw::with_font(None).annotate(&frame, &Overlay::default());
    assert_eq!(image, frame);
  }

  #[test]
  fn missing_font_file_is_tolerated() {
    assert!(!Draw::from_font_path("/no/such/font.ttf").has_font());
  }

  #[test]
  fn record_line_contains_label_score_and_box() {
    let overlay = Overlay {
      label: DisplayedLabel::Letter(Letter::W),
      score: Some(0.93),
      roi: Some(roi()),
      ..Default::default()
    };
    assert_eq!(Record::format(&overlay), "W, 0.9300, 10, 20, 50, 60");
    assert_eq!(Record::format(&Overlay::default()), "#");
  }
}
