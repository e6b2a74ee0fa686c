// 该文件是 Shouyu （手语） 项目的一部分。
// src/input/v4l2_source.rs - V4L2 摄像头
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

use std::pin::Pin;

use image::RgbImage;
use tracing::{debug, info};
use url::Url;
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use super::{CameraError, CameraSource};
use crate::{FromUrl, FromUrlWithScheme, query_value};

const DEFAULT_DEVICE: &str = "/dev/video0";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const BUFFER_COUNT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
  Yuyv,
  Mjpg,
}

impl PixelFormat {
  fn from_fourcc(fourcc: FourCC) -> Result<Self, CameraError> {
    match &fourcc.repr {
      b"YUYV" => Ok(PixelFormat::Yuyv),
      b"MJPG" => Ok(PixelFormat::Mjpg),
      _ => Err(CameraError::UnsupportedPixelFormat(fourcc.to_string())),
    }
  }
}

/// V4L2 摄像头
///
/// `Stream` 借用 `Device`，所以设备放在 `Pin<Box>` 中保证地址不变，
/// 并在 `Drop` 中先释放流再释放设备。
pub struct V4l2Camera {
  device: Pin<Box<Device>>,
  stream: Option<Stream<'static>>,
  path: String,
  format: PixelFormat,
  width: u32,
  height: u32,
}

impl FromUrlWithScheme for V4l2Camera {
  const SCHEME: &'static str = "v4l";
}

impl FromUrl for V4l2Camera {
  type Error = CameraError;

  /// `v4l:///dev/video0?width=640&height=480`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CameraError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let path = if url.path().is_empty() || url.path() == "/" {
      DEFAULT_DEVICE
    } else {
      url.path()
    };
    let width = query_value(url, "width").unwrap_or(DEFAULT_WIDTH);
    let height = query_value(url, "height").unwrap_or(DEFAULT_HEIGHT);

    Self::open(path, width, height)
  }
}

impl V4l2Camera {
  pub fn open(path: &str, width: u32, height: u32) -> Result<Self, CameraError> {
    let device = Box::pin(
      Device::with_path(path).map_err(|e| CameraError::Open(format!("{}: {}", path, e)))?,
    );

    let mut format = device
      .format()
      .map_err(|e| CameraError::Open(e.to_string()))?;
    format.width = width;
    format.height = height;
    format.fourcc = FourCC::new(b"YUYV");
    let format = device
      .set_format(&format)
      .map_err(|e| CameraError::Open(e.to_string()))?;
    let pixel_format = PixelFormat::from_fourcc(format.fourcc)?;

    info!(
      "打开摄像头 {}: {}x{} {:?}",
      path, format.width, format.height, pixel_format
    );

    let mut camera = Self {
      device,
      stream: None,
      path: path.to_string(),
      format: pixel_format,
      width: format.width,
      height: format.height,
    };

    // SAFETY: device 固定在堆上且不会移动；stream 与 device 同属一个结构体，
    // Drop 时先 take stream，因此引用在 stream 存活期间始终有效
    let device_ref: &Device = &camera.device;
    let stream = unsafe {
      let device_static: &'static Device = std::mem::transmute(device_ref);
      Stream::with_buffers(device_static, Type::VideoCapture, BUFFER_COUNT)
        .map_err(|e| CameraError::Open(format!("无法创建捕获流: {}", e)))?
    };

    camera.stream = Some(stream);
    Ok(camera)
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }
}

/// YUYV (4:2:2) 转 RGB，每 4 字节对应两个像素
pub(crate) fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
  let mut rgb = Vec::with_capacity((width * height * 3) as usize);

  for chunk in yuyv.chunks_exact(4) {
    let u = chunk[1] as f32 - 128.0;
    let v = chunk[3] as f32 - 128.0;

    for y in [chunk[0] as f32, chunk[2] as f32] {
      let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);
    }
  }

  rgb
}

impl CameraSource for V4l2Camera {
  type Error = CameraError;

  fn read(&mut self) -> Result<RgbImage, Self::Error> {
    let stream = self
      .stream
      .as_mut()
      .ok_or_else(|| CameraError::Read("捕获流已关闭".to_string()))?;

    let (buffer, meta) = stream
      .next()
      .map_err(|e| CameraError::Read(e.to_string()))?;
    let used = (meta.bytesused as usize).min(buffer.len());
    let data = if used > 0 { &buffer[..used] } else { buffer };

    match self.format {
      PixelFormat::Yuyv => {
        let rgb = yuyv_to_rgb(data, self.width, self.height);
        RgbImage::from_raw(self.width, self.height, rgb).ok_or_else(|| {
          CameraError::Read(format!("帧数据长度 {} 与 {}x{} 不符", data.len(), self.width, self.height))
        })
      }
      PixelFormat::Mjpg => {
        Ok(image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)?.to_rgb8())
      }
    }
  }
}

impl Drop for V4l2Camera {
  fn drop(&mut self) {
    self.stream.take();
    debug!("摄像头 {} 已释放", self.path);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gray_yuyv_maps_to_gray_rgb() {
    let rgb = yuyv_to_rgb(&[128, 128, 128, 128], 2, 1);
    assert_eq!(rgb, vec![128, 128, 128, 128, 128, 128]);
  }

  #[test]
  fn yuyv_channels_saturate() {
    let rgb = yuyv_to_rgb(&[255, 128, 0, 255], 2, 1);
    assert_eq!(&rgb[..3], &[255, 164, 255]);
    assert_eq!(rgb[3], 178);
  }

  #[test]
  fn trailing_bytes_are_ignored() {
    assert_eq!(yuyv_to_rgb(&[16, 128, 16, 128, 1, 2], 2, 1).len(), 6);
  }

  #[test]
  fn unknown_fourcc_is_rejected() {
    assert!(matches!(
      PixelFormat::from_fourcc(FourCC::new(b"RGB3")),
      Err(CameraError::UnsupportedPixelFormat(_))
    ));
  }
}
