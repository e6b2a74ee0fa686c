// 该文件是 Shouyu （手语） 项目的一部分。
// src/landmark/hand_network.rs - 基于 ONNX 的手部关键点网络
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

use image::{RgbImage, imageops};
use tracing::{debug, info, warn};
use tract_onnx::prelude::{
  Framework, Graph, InferenceModelExt, SimplePlan, Tensor, TypedFact, TypedOp, tract_ndarray,
  tvec,
};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  landmark::{HAND_LANDMARK_COUNT, Landmark, LandmarkDetector, LandmarkError, LandmarkSet},
  query_value, url_path,
};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

const DEFAULT_PRESENCE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputLayout {
  Nchw,
  Nhwc,
}

/// 手部关键点网络
///
/// 整帧缩放到网络输入分辨率后推理。输出 0 为 21×3 的关键点坐标（以输入像素为单位），
/// 输出 1 为手部存在置信度。每帧最多给出一只手。
pub struct HandLandmarkNetwork {
  plan: Plan,
  layout: InputLayout,
  width: u32,
  height: u32,
  presence_threshold: f32,
}

impl FromUrlWithScheme for HandLandmarkNetwork {
  const SCHEME: &'static str = "onnx";
}

impl FromUrl for HandLandmarkNetwork {
  type Error = LandmarkError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LandmarkError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = url_path(url);
    info!("加载手部关键点模型: {}", path.display());

    let graph = tract_onnx::onnx()
      .model_for_path(&path)
      .and_then(|model| model.into_optimized())
      .map_err(|e| LandmarkError::Network(e.to_string()))?;

    let input_shape = graph
      .input_fact(0)
      .map_err(|e| LandmarkError::Network(e.to_string()))?
      .shape
      .as_concrete()
      .map(|shape| shape.to_vec())
      .ok_or_else(|| LandmarkError::Network("输入形状不是常量".to_string()))?;

    let (layout, height, width) = match input_shape.as_slice() {
      [1, 3, h, w] => (InputLayout::Nchw, *h, *w),
      [1, h, w, 3] => (InputLayout::Nhwc, *h, *w),
      other => {
        return Err(LandmarkError::Network(format!(
          "不支持的输入形状: {:?}",
          other
        )));
      }
    };

    let num_outputs = graph
      .output_outlets()
      .map_err(|e| LandmarkError::Network(e.to_string()))?
      .len();
    if num_outputs < 2 {
      return Err(LandmarkError::Network(format!(
        "模型至少需要 2 个输出, 实际为 {}",
        num_outputs
      )));
    }

    let plan = graph
      .into_runnable()
      .map_err(|e| LandmarkError::Network(e.to_string()))?;

    let presence_threshold = query_value(url, "presence").unwrap_or(DEFAULT_PRESENCE_THRESHOLD);
    debug!(
      "关键点模型输入: {:?} {}x{}, 存在阈值 {}",
      layout, width, height, presence_threshold
    );

    Ok(Self {
      plan,
      layout,
      width: width as u32,
      height: height as u32,
      presence_threshold,
    })
  }
}

impl HandLandmarkNetwork {
  fn input_tensor(&self, frame: &RgbImage) -> Tensor {
    let resized = imageops::resize(
      frame,
      self.width,
      self.height,
      imageops::FilterType::Triangle,
    );
    let (h, w) = (self.height as usize, self.width as usize);
    let sample = |x: usize, y: usize, c: usize| resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;

    match self.layout {
      InputLayout::Nchw => {
        tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| sample(x, y, c)).into()
      }
      InputLayout::Nhwc => {
        tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| sample(x, y, c)).into()
      }
    }
  }
}

impl LandmarkDetector for HandLandmarkNetwork {
  type Error = LandmarkError;

  fn detect(&mut self, frame: &RgbImage) -> Result<Vec<LandmarkSet>, Self::Error> {
    let outputs = self
      .plan
      .run(tvec!(self.input_tensor(frame).into()))
      .map_err(|e| LandmarkError::Network(e.to_string()))?;

    let coords = outputs[0]
      .as_slice::<f32>()
      .map_err(|e| LandmarkError::Network(e.to_string()))?;
    let presence = outputs[1]
      .as_slice::<f32>()
      .map_err(|e| LandmarkError::Network(e.to_string()))?
      .first()
      .copied()
      .unwrap_or(0.0);

    if presence < self.presence_threshold {
      return Ok(Vec::new());
    }

    if coords.len() < HAND_LANDMARK_COUNT * 3 {
      return Err(LandmarkError::Network(format!(
        "关键点输出长度 {} 不足",
        coords.len()
      )));
    }

    let hand = landmarks_from_coords(coords, self.width, self.height);
    if hand.is_none() {
      warn!("关键点输出含非有限值，按无手处理");
    }
    Ok(hand.into_iter().collect())
  }
}

/// 把以输入像素为单位的 `[x, y, z]` 输出换算为归一化关键点
///
/// 任一坐标不是有限值时返回 `None`。
fn landmarks_from_coords(coords: &[f32], width: u32, height: u32) -> Option<LandmarkSet> {
  let points = coords
    .chunks_exact(3)
    .take(HAND_LANDMARK_COUNT)
    .map(|xyz| {
      let (x, y) = (xyz[0] / width as f32, xyz[1] / height as f32);
      (x.is_finite() && y.is_finite()).then(|| Landmark::new(x, y))
    })
    .collect::<Option<Vec<_>>>()?;

  LandmarkSet::from_slice(&points)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::landmark::LandmarkIdx;

  fn coords_with(anchor: [f32; 3]) -> Vec<f32> {
    let mut coords = vec![128.0f32; HAND_LANDMARK_COUNT * 3];
    let i = LandmarkIdx::MiddleFingerMcp as usize * 3;
    coords[i..i + 3].copy_from_slice(&anchor);
    coords
  }

  #[test]
  fn coordinates_are_normalized_by_input_size() {
    let hand = landmarks_from_coords(&coords_with([64.0, 192.0, 0.0]), 256, 256).unwrap();
    let anchor = hand.get(LandmarkIdx::MiddleFingerMcp);
    assert_eq!((anchor.x, anchor.y), (0.25, 0.75));
  }

  #[test]
  fn non_finite_output_means_no_hand() {
    assert!(landmarks_from_coords(&coords_with([f32::NAN, 10.0, 0.0]), 256, 256).is_none());
    assert!(landmarks_from_coords(&coords_with([10.0, f32::INFINITY, 0.0]), 256, 256).is_none());
  }

  #[test]
  fn short_output_means_no_hand() {
    assert!(landmarks_from_coords(&[1.0; 30], 256, 256).is_none());
  }
}
