// 该文件是 Shouyu （手语） 项目的一部分。
// src/args.rs - 命令行参数
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

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use shouyu::{config::AppConfig, model::ConfigError};

/// 实时手语字母识别
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分类模型: vgg, resnet, googlenet, convnext（不区分大小写）
  #[arg(value_name = "MODEL")]
  pub model: String,

  /// 权重文件所在目录
  #[arg(long, value_name = "DIR", default_value = ".")]
  pub weights_dir: PathBuf,

  /// 输入来源，默认 v4l:///dev/video0
  /// - v4l:///dev/videoN?width=640&height=480
  /// - image:///path/to/image_or_dir?loop
  #[arg(long, value_name = "SOURCE")]
  pub input: Option<Url>,

  /// 输出，默认 gst://display
  /// - gst://display
  /// - image:///path/to/out.png
  /// - folder:///path/to/dir?always&record
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<Url>,

  /// 手部关键点来源，默认工作目录下的 hand_landmark.onnx
  /// - onnx:///path/to/hand_landmark.onnx?presence=0.5
  /// - replay:///path/to/landmarks.jsonl
  #[arg(long, value_name = "LANDMARKS")]
  pub landmarks: Option<Url>,

  /// 叠加文字所用的 TrueType 字体
  #[arg(long, value_name = "FILE")]
  pub font: Option<PathBuf>,

  /// 处理指定帧数后退出
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,
}

impl Args {
  pub fn into_config(self) -> Result<AppConfig, ConfigError> {
    Ok(
      AppConfig::new(&self.model, &self.weights_dir)?
        .with_input(self.input)
        .with_output(self.output)
        .with_landmarks(self.landmarks)
        .with_font(self.font)
        .with_frame_number(self.frame_number),
    )
  }
}
