// 该文件是 Shouyu （手语） 项目的一部分。
// src/model/registry.rs - 模型注册表
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

//! 模型名称到加载参数的静态映射。
//!
//! 名称匹配不区分大小写。`googlenet` 是已知名称但没有对应的加载器，
//! 解析时会被明确拒绝，而不是等到加载阶段才失败。

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::label::Letter;

/// 所有骨干网络的输入分辨率 (宽, 高)
pub const INPUT_RESOLUTION: (u32, u32) = (224, 224);

/// 权重文件扩展名，权重以 ONNX 格式导出
pub const WEIGHTS_EXTENSION: &str = "onnx";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
  #[error("未知的模型名称 '{0}'，可选: vgg, resnet, googlenet, convnext")]
  UnknownModel(String),
  #[error("模型 '{0}' 没有注册加载器")]
  MissingLoader(String),
  #[error("无效的 URL '{0}'")]
  InvalidUrl(String),
}

/// 可加载的骨干网络
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
  Vgg,
  Resnet,
  Convnext,
}

/// 替换后的分类头结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadKind {
  /// 单个全连接层，输出 logits
  Linear,
  /// LayerNorm + 两层带 BatchNorm/Dropout 的全连接，末尾为 LogSoftmax
  NormalizedMlp,
}

impl ModelKind {
  pub fn token(self) -> &'static str {
    match self {
      ModelKind::Vgg => "vgg",
      ModelKind::Resnet => "resnet",
      ModelKind::Convnext => "convnext",
    }
  }

  pub fn weights_stem(self) -> &'static str {
    match self {
      ModelKind::Vgg => "VGG19_libras",
      ModelKind::Resnet => "resnet_libras",
      ModelKind::Convnext => "convnext_libras",
    }
  }

  pub fn head(self) -> HeadKind {
    match self {
      ModelKind::Vgg | ModelKind::Resnet => HeadKind::Linear,
      ModelKind::Convnext => HeadKind::NormalizedMlp,
    }
  }
}

// `None` 表示名称已知，但没有可用的加载器
const REGISTRY: &[(&str, Option<ModelKind>)] = &[
  ("vgg", Some(ModelKind::Vgg)),
  ("resnet", Some(ModelKind::Resnet)),
  ("googlenet", None),
  ("convnext", Some(ModelKind::Convnext)),
];

/// 一个骨干网络的加载参数，启动时构造一次，之后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
  pub kind: ModelKind,
  pub weights: PathBuf,
  pub input_width: u32,
  pub input_height: u32,
  pub num_classes: usize,
}

impl ModelDescriptor {
  pub fn new(kind: ModelKind) -> Self {
    let (input_width, input_height) = INPUT_RESOLUTION;
    Self {
      kind,
      weights: PathBuf::from(format!("{}.{}", kind.weights_stem(), WEIGHTS_EXTENSION)),
      input_width,
      input_height,
      num_classes: Letter::COUNT,
    }
  }

  /// 将权重文件放到指定目录下
  pub fn with_weights_dir(mut self, dir: &Path) -> Self {
    if let Some(name) = self.weights.file_name() {
      self.weights = dir.join(name);
    }
    self
  }

  pub fn head(&self) -> HeadKind {
    self.kind.head()
  }
}

/// 按名称解析模型描述，不区分大小写
pub fn resolve(name: &str) -> Result<ModelDescriptor, ConfigError> {
  let token = name.trim().to_lowercase();
  match REGISTRY.iter().find(|(key, _)| *key == token) {
    Some((_, Some(kind))) => Ok(ModelDescriptor::new(*kind)),
    Some((key, None)) => Err(ConfigError::MissingLoader(key.to_string())),
    None => Err(ConfigError::UnknownModel(name.to_string())),
  }
}
