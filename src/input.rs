// 该文件是 Shouyu （手语） 项目的一部分。
// src/input.rs - 摄像头/图像输入
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

use crate::{FromUrl, FromUrlWithScheme};

mod image_source;
mod v4l2_source;

pub use self::image_source::ImageSource;
pub use self::v4l2_source::V4l2Camera;

/// 帧来源，每次调用返回一帧 RGB 图像；失败不可恢复
pub trait CameraSource {
  type Error;

  fn read(&mut self) -> Result<RgbImage, Self::Error>;
}

#[derive(Error, Debug)]
pub enum CameraError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无法打开输入: {0}")]
  Open(String),
  #[error("无法读取帧: {0}")]
  Read(String),
  #[error("不支持的像素格式: {0}")]
  UnsupportedPixelFormat(String),
  #[error("输入已结束")]
  EndOfStream,
  #[error("图像解码错误: {0}")]
  Image(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  Io(#[from] std::io::Error),
}

pub enum InputWrapper {
  V4l2(V4l2Camera),
  Image(ImageSource),
}

impl FromUrl for InputWrapper {
  type Error = CameraError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      V4l2Camera::SCHEME => Ok(InputWrapper::V4l2(V4l2Camera::from_url(url)?)),
      ImageSource::SCHEME => Ok(InputWrapper::Image(ImageSource::from_url(url)?)),
      other => Err(CameraError::SchemeMismatch(format!(
        "不支持的输入 '{}'",
        other
      ))),
    }
  }
}

impl CameraSource for InputWrapper {
  type Error = CameraError;

  fn read(&mut self) -> Result<RgbImage, Self::Error> {
    match self {
      InputWrapper::V4l2(camera) => camera.read(),
      InputWrapper::Image(source) => source.read(),
    }
  }
}
