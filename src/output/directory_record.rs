// 该文件是 Shouyu （手语） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
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
use std::sync::Mutex;

use chrono::{Datelike, Local};
use image::RgbImage;
use thiserror::Error;
use tracing::info;

use crate::{
  FromUrl, FromUrlWithScheme,
  output::{
    Overlay, Render,
    draw::{Draw, Record},
  },
  query_flag, url_path,
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 按日期分目录保存标注后的帧：`<dir>/<年>/<月>/<日>/<时-分-秒>-<序号>.png`
///
/// 默认只保存检测到手的帧，`always` 保存每一帧；`record` 额外写出 `.txt` 旁注。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  draw: Draw,
  record: Option<Record>,
  frame_counter: Mutex<u16>,
  always: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let always = query_flag(uri, "always");
    let record = query_flag(uri, "record").then_some(Record);
    let directory = url_path(uri);
    info!(
      "目录记录: {}, 每帧保存 {}, 旁注 {}",
      directory.display(),
      always,
      record.is_some()
    );

    Ok(DirectoryRecordOutput {
      directory,
      draw: Draw::default(),
      record,
      frame_counter: Mutex::new(0),
      always,
    })
  }
}

impl DirectoryRecordOutput {
  pub fn with_draw(mut self, draw: Draw) -> Self {
    self.draw = draw;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.directory
  }

  fn frame_id(&self) -> u16 {
    let mut counter = self
      .frame_counter
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    *counter = counter.wrapping_add(1);
    *counter
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Local::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    std::fs::create_dir_all(&directory)?;

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<RgbImage> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &RgbImage, overlay: &Overlay<'_>) -> Result<(), Self::Error> {
    if !self.always && !overlay.has_hand() {
      return Ok(());
    }

    let path = self.frame_path()?;
    self.draw.annotate(frame, overlay).save(&path)?;
    if let Some(record) = &self.record {
      record.record(overlay, &path)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    label::{DisplayedLabel, Letter},
    roi::Roi,
  };

  fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    for entry in std::fs::read_dir(dir).unwrap() {
      let path = entry.unwrap().path();
      if path.is_dir() {
        collect_files(&path, out);
      } else {
        out.push(path);
      }
    }
  }

  #[test]
  fn saves_only_hand_frames_with_sidecar() {
    let dir = std::env::temp_dir().join(format!("shouyu-record-{:016x}", fastrand::u64(..)));
    let url = url::Url::parse(&format!("folder://{}?record", dir.display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url)
      .unwrap()
      .with_draw(Draw::with_font(None));

    let frame = RgbImage::new(32, 32);
    output.render_result(&frame, &Overlay::default()).unwrap();
    assert!(!dir.exists());

    let overlay = Overlay {
      label: DisplayedLabel::Letter(Letter::O),
      score: Some(0.97),
      roi: Some(Roi {
        x0: 0,
        y0: 0,
        x1: 16,
        y1: 16,
      }),
      ..Default::default()
    };
    output.render_result(&frame, &overlay).unwrap();

    let mut files = Vec::new();
    collect_files(&dir, &mut files);
    files.sort();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].extension().unwrap(), "png");
    let sidecar = std::fs::read_to_string(&files[1]).unwrap();
    assert_eq!(sidecar, "O, 0.9700, 0, 0, 16, 16");

    std::fs::remove_dir_all(dir).unwrap();
  }
}
