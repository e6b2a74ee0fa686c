// 该文件是 Shouyu （手语） 项目的一部分。
// src/landmark/replay.rs - 关键点回放
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

use std::collections::VecDeque;
use std::path::Path;

use image::RgbImage;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  landmark::{Landmark, LandmarkDetector, LandmarkError, LandmarkSet},
  url_path,
};

/// 从 JSON Lines 文件回放关键点，每行对应一帧
///
/// 每行是一个数组，元素为一只手，每只手是 21 个 `[x, y]`。空行或 `[]` 表示该帧没有手。
/// 回放结束后每帧都返回空结果。
pub struct ReplayLandmarks {
  frames: VecDeque<Vec<LandmarkSet>>,
  exhausted: bool,
}

impl FromUrlWithScheme for ReplayLandmarks {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayLandmarks {
  type Error = LandmarkError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(LandmarkError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Self::from_path(url_path(url))
  }
}

impl ReplayLandmarks {
  pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LandmarkError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let replay = Self::parse(&content)?;
    info!(
      "已载入关键点回放 {}: {} 帧",
      path.as_ref().display(),
      replay.frames.len()
    );
    Ok(replay)
  }

  pub fn parse(content: &str) -> Result<Self, LandmarkError> {
    let mut frames = VecDeque::new();

    for (index, line) in content.lines().enumerate() {
      let line_no = index + 1;
      let line = line.trim();
      if line.is_empty() {
        frames.push_back(Vec::new());
        continue;
      }

      let hands: Vec<Vec<[f32; 2]>> =
        serde_json::from_str(line).map_err(|e| LandmarkError::Replay {
          line: line_no,
          reason: e.to_string(),
        })?;

      let sets = hands
        .iter()
        .map(|hand| {
          let points: Vec<Landmark> = hand.iter().map(|&[x, y]| Landmark::new(x, y)).collect();
          LandmarkSet::from_slice(&points).ok_or_else(|| LandmarkError::Replay {
            line: line_no,
            reason: format!("每只手需要 21 个关键点, 实际为 {}", points.len()),
          })
        })
        .collect::<Result<Vec<_>, _>>()?;

      frames.push_back(sets);
    }

    Ok(Self {
      frames,
      exhausted: false,
    })
  }

  pub fn remaining(&self) -> usize {
    self.frames.len()
  }
}

impl LandmarkDetector for ReplayLandmarks {
  type Error = LandmarkError;

  fn detect(&mut self, _frame: &RgbImage) -> Result<Vec<LandmarkSet>, Self::Error> {
    match self.frames.pop_front() {
      Some(sets) => Ok(sets),
      None => {
        if !self.exhausted {
          warn!("关键点回放已结束");
          self.exhausted = true;
        }
        Ok(Vec::new())
      }
    }
  }
}
