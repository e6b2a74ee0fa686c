// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/gstreamer_display.rs - GStreamer 窗口显示
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

//! # GStreamer 窗口显示
//!
//! 打开两个窗口：一个显示叠加了识别结果的画面，另一个显示 ROI 裁剪的预览。
//!
//! ## URL Scheme
//!
//! `gst://display?sink=autovideosink`
//!
//! - `sink`: 视频输出元素，默认 `autovideosink`
//!
//! 任一窗口被关闭时，下一次 `render_result` 会返回错误，主循环随之退出。

use std::sync::Mutex;

use gstreamer::{self as gst, prelude::*};
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::{RgbImage, imageops};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{Overlay, Render, draw::Draw},
  query_value,
};

/// 裁剪预览窗口的边长
pub const PREVIEW_SIZE: u32 = 280;

const DEFAULT_SINK: &str = "autovideosink";

#[derive(Error, Debug)]
pub enum GStreamerDisplayError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("GStreamer 错误: {0}")]
  GStreamerError(#[from] gst::glib::Error),
  #[error("GStreamer 布尔操作错误: {0}")]
  GStreamerBoolError(#[from] gst::glib::BoolError),
  #[error("找不到 appsrc 元素: {0}")]
  AppSrcNotFound(&'static str),
  #[error("元素不是 appsrc: {0}")]
  AppSrcConversionFailed(&'static str),
  #[error("管道错误: {0}")]
  PipelineError(String),
  #[error("状态改变错误: {0}")]
  StateChangeError(#[from] gst::StateChangeError),
  #[error("推送缓冲区失败: {0:?}")]
  FlowError(gst::FlowError),
}

/// 单路 appsrc，首次推送或分辨率变化时设置 caps
struct Feed {
  appsrc: gst_app::AppSrc,
  size: Mutex<Option<(u32, u32)>>,
}

impl Feed {
  fn new(pipeline: &gst::Pipeline, name: &'static str) -> Result<Self, GStreamerDisplayError> {
    let appsrc = pipeline
      .by_name(name)
      .ok_or(GStreamerDisplayError::AppSrcNotFound(name))?
      .downcast::<gst_app::AppSrc>()
      .map_err(|_| GStreamerDisplayError::AppSrcConversionFailed(name))?;
    appsrc.set_format(gst::Format::Time);
    Ok(Self {
      appsrc,
      size: Mutex::new(None),
    })
  }

  fn push(&self, image: &RgbImage) -> Result<(), GStreamerDisplayError> {
    let (width, height) = image.dimensions();
    let info = gst_video::VideoInfo::builder(gst_video::VideoFormat::Rgb, width, height).build()?;

    {
      let mut size = self
        .size
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
      if *size != Some((width, height)) {
        self.appsrc.set_caps(Some(&info.to_caps()?));
        debug!("appsrc caps: {}x{}", width, height);
        *size = Some((width, height));
      }
    }

    let data = pad_rows(image, info.stride()[0] as usize);
    self
      .appsrc
      .push_buffer(gst::Buffer::from_mut_slice(data))
      .map_err(GStreamerDisplayError::FlowError)?;
    Ok(())
  }
}

/// 按 GStreamer 的行跨度补齐每一行
fn pad_rows(image: &RgbImage, stride: usize) -> Vec<u8> {
  let row = image.width() as usize * 3;
  if stride == row {
    return image.as_raw().clone();
  }
  let mut data = vec![0u8; stride * image.height() as usize];
  for (src, dst) in image.as_raw().chunks_exact(row).zip(data.chunks_exact_mut(stride)) {
    dst[..row].copy_from_slice(src);
  }
  data
}

pub struct GStreamerDisplay {
  pipeline: gst::Pipeline,
  frame: Feed,
  preview: Feed,
  draw: Draw,
  frame_count: Mutex<u64>,
}

impl FromUrlWithScheme for GStreamerDisplay {
  const SCHEME: &'static str = "gst";
}

impl FromUrl for GStreamerDisplay {
  type Error = GStreamerDisplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(GStreamerDisplayError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    gst::init()?;

    let sink: String = query_value(url, "sink").unwrap_or_else(|| DEFAULT_SINK.to_string());
    let pipeline_desc = format!(
      "appsrc name=frame is-live=true do-timestamp=true ! videoconvert ! {sink} \
       appsrc name=preview is-live=true do-timestamp=true ! videoconvert ! {sink}"
    );
    info!("创建显示管道: {}", pipeline_desc);

    let pipeline = gst::parse::launch(&pipeline_desc)?
      .downcast::<gst::Pipeline>()
      .map_err(|_| GStreamerDisplayError::PipelineError("无法创建管道".to_string()))?;

    let frame = Feed::new(&pipeline, "frame")?;
    let preview = Feed::new(&pipeline, "preview")?;

    pipeline.set_state(gst::State::Playing)?;

    Ok(GStreamerDisplay {
      pipeline,
      frame,
      preview,
      draw: Draw::default(),
      frame_count: Mutex::new(0),
    })
  }
}

impl GStreamerDisplay {
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  /// 窗口被关闭或管道出错时返回错误
  fn check_bus(&self) -> Result<(), GStreamerDisplayError> {
    let Some(bus) = self.pipeline.bus() else {
      return Ok(());
    };
    while let Some(msg) = bus.pop_filtered(&[gst::MessageType::Error, gst::MessageType::Eos]) {
      match msg.view() {
        gst::MessageView::Error(err) => {
          return Err(GStreamerDisplayError::PipelineError(format!(
            "{}: {}",
            err
              .src()
              .map(|s| s.path_string().to_string())
              .unwrap_or_default(),
            err.error()
          )));
        }
        gst::MessageView::Eos(..) => {
          return Err(GStreamerDisplayError::PipelineError("显示管道已结束".to_string()));
        }
        _ => {}
      }
    }
    Ok(())
  }
}

impl Drop for GStreamerDisplay {
  fn drop(&mut self) {
    let _ = self.frame.appsrc.end_of_stream();
    let _ = self.preview.appsrc.end_of_stream();

    std::thread::sleep(std::time::Duration::from_millis(100));

    if let Err(e) = self.pipeline.set_state(gst::State::Null) {
      warn!("无法停止显示管道: {}", e);
    }

    let frame_count = self
      .frame_count
      .lock()
      .map(|count| *count)
      .unwrap_or_default();
    info!("显示窗口已关闭, 共显示 {} 帧", frame_count);
  }
}

impl Render<RgbImage> for GStreamerDisplay {
  type Error = GStreamerDisplayError;

  fn render_result(&self, frame: &RgbImage, overlay: &Overlay<'_>) -> Result<(), Self::Error> {
    self.check_bus()?;

    let annotated = self.draw.annotate(frame, overlay);
    self.frame.push(&annotated)?;

    if let Some(crop) = overlay.crop.filter(|crop| crop.width() > 0 && crop.height() > 0) {
      let preview = imageops::resize(
        crop,
        PREVIEW_SIZE,
        PREVIEW_SIZE,
        imageops::FilterType::Triangle,
      );
      self.preview.push(&preview)?;
    }

    if let Ok(mut count) = self.frame_count.lock() {
      *count += 1;
    }
    Ok(())
  }
}
