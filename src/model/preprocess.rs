// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/preprocess.rs - 分类器输入预处理
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
use tract_onnx::prelude::tract_ndarray::Array4;

use crate::roi::Roi;

/// ImageNet 通道均值
pub const CHANNEL_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet 通道标准差
pub const CHANNEL_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 归一化后的 NCHW 张量，形状为 `[1, 3, H, W]`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierInput {
  tensor: Array4<f32>,
}

impl ClassifierInput {
  pub fn shape(&self) -> &[usize] {
    self.tensor.shape()
  }

  pub fn tensor(&self) -> &Array4<f32> {
    &self.tensor
  }
}

/// 从帧中裁剪出 ROI 区域
pub fn crop(frame: &RgbImage, roi: &Roi) -> RgbImage {
  imageops::crop_imm(frame, roi.x0, roi.y0, roi.width(), roi.height()).to_image()
}

/// 双线性缩放到模型输入分辨率，并按通道做均值/方差归一化
pub fn normalize(image: &RgbImage, width: u32, height: u32) -> ClassifierInput {
  let resized = imageops::resize(image, width, height, imageops::FilterType::Triangle);

  let tensor = Array4::from_shape_fn(
    (1, 3, height as usize, width as usize),
    |(_, c, y, x)| {
      let value = resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0;
      (value - CHANNEL_MEAN[c]) / CHANNEL_STD[c]
    },
  );

  ClassifierInput { tensor }
}
