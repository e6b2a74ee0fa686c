// 该文件是 Shouyu （手语） 项目的一部分。
// src/model.rs - 模型
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

use crate::label::{Letter, WithLabel};

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 单个类别及其概率
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
  pub label: Letter,
  pub score: f32,
}

/// 字母表上的概率分布，各项之和为 1
#[derive(Debug, Clone, PartialEq)]
pub struct ClassProbability {
  probs: Box<[f32]>,
}

impl ClassProbability {
  /// 对模型原始输出做 softmax 归一化
  ///
  /// 输出长度与字母表大小不一致时返回 `None`。对数概率（log-softmax）输出同样适用，
  /// softmax 对其结果与对 logits 的结果相同。
  pub fn from_logits(logits: &[f32]) -> Option<Self> {
    if logits.len() != Letter::COUNT {
      return None;
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    Some(Self {
      probs: exps.into_iter().map(|e| e / sum).collect(),
    })
  }

  pub fn probabilities(&self) -> &[f32] {
    &self.probs
  }

  /// 概率最高的类别；并列时取编号较小者
  pub fn top1(&self) -> Prediction {
    let (id, score) = self
      .probs
      .iter()
      .copied()
      .enumerate()
      .fold((0, f32::NEG_INFINITY), |best, (i, p)| {
        if p > best.1 { (i, p) } else { best }
      });

    Prediction {
      label: Letter::ALL[id],
      score: score.max(0.0),
    }
  }

  /// 按概率降序返回前 `k` 个类别
  pub fn top_k(&self, k: usize) -> Vec<Prediction> {
    let mut items: Vec<Prediction> = self
      .probs
      .iter()
      .enumerate()
      .filter_map(|(i, &score)| {
        Letter::from_label_id(i as u32).map(|label| Prediction { label, score })
      })
      .collect();
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items.truncate(k);
    items
  }
}

pub mod classifier;
pub mod preprocess;
pub mod registry;

pub use self::classifier::{Classifier, ClassifyError, ModelLoadError};
pub use self::preprocess::ClassifierInput;
pub use self::registry::{ConfigError, HeadKind, ModelDescriptor, ModelKind};
