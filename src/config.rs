// 该文件是 Shouyu （手语） 项目的一部分。
// src/config.rs - 运行配置
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

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::{
  model::{ConfigError, ModelDescriptor, registry},
  output::draw::DEFAULT_FONT_PATH,
};

pub const DEFAULT_INPUT: &str = "v4l:///dev/video0";
pub const DEFAULT_OUTPUT: &str = "gst://display";
pub const DEFAULT_LANDMARK_MODEL: &str = "hand_landmark.onnx";

/// 启动时构造一次的运行配置，之后只读
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub descriptor: ModelDescriptor,
  pub input: Url,
  pub output: Url,
  pub landmarks: Url,
  pub font: PathBuf,
  pub frame_number: Option<usize>,
}

impl AppConfig {
  /// 解析模型名称，其余各项取默认值
  ///
  /// 模型名称无效时返回 [`ConfigError`]，此时尚未打开任何资源。
  pub fn new(model: &str, weights_dir: &Path) -> Result<Self, ConfigError> {
    let descriptor = registry::resolve(model)?.with_weights_dir(weights_dir);
    Ok(Self {
      descriptor,
      input: parse_url(DEFAULT_INPUT)?,
      output: parse_url(DEFAULT_OUTPUT)?,
      landmarks: default_landmarks_url()?,
      font: PathBuf::from(DEFAULT_FONT_PATH),
      frame_number: None,
    })
  }

  pub fn with_input(mut self, input: Option<Url>) -> Self {
    if let Some(input) = input {
      self.input = input;
    }
    self
  }

  pub fn with_output(mut self, output: Option<Url>) -> Self {
    if let Some(output) = output {
      self.output = output;
    }
    self
  }

  pub fn with_landmarks(mut self, landmarks: Option<Url>) -> Self {
    if let Some(landmarks) = landmarks {
      self.landmarks = landmarks;
    }
    self
  }

  pub fn with_font(mut self, font: Option<PathBuf>) -> Self {
    if let Some(font) = font {
      self.font = font;
    }
    self
  }

  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn log(&self) {
    info!(
      "模型: {} ({:?} 分类头), 权重: {}",
      self.descriptor.kind.token(),
      self.descriptor.head(),
      self.descriptor.weights.display()
    );
    info!("输入来源: {}", self.input);
    info!("输出路径: {}", self.output);
    info!("关键点来源: {}", self.landmarks);
    info!("字体: {}", self.font.display());
  }
}

fn parse_url(s: &str) -> Result<Url, ConfigError> {
  Url::parse(s).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", s, e)))
}

/// 工作目录下的 `hand_landmark.onnx`
fn default_landmarks_url() -> Result<Url, ConfigError> {
  let path = std::env::current_dir()
    .map(|dir| dir.join(DEFAULT_LANDMARK_MODEL))
    .unwrap_or_else(|_| PathBuf::from(DEFAULT_LANDMARK_MODEL));
  parse_url(&format!("onnx://{}", path.display()))
}
