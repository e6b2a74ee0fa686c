// 该文件是 Shouyu （手语） 项目的一部分。
// src/input/image_source.rs - 图像文件输入
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

use image::{ImageReader, RgbImage};
use tracing::info;
use url::Url;

use super::{CameraError, CameraSource};
use crate::{FromUrl, FromUrlWithScheme, query_flag, url_path};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// 把单张图片或目录中的图片当作帧序列
///
/// 目录按文件名排序；带 `loop` 参数时循环播放，否则读完后返回
/// [`CameraError::EndOfStream`]。
pub struct ImageSource {
  paths: Vec<PathBuf>,
  next: usize,
  looping: bool,
}

impl FromUrlWithScheme for ImageSource {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageSource {
  type Error = CameraError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CameraError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }
    Self::open(url_path(url), query_flag(url, "loop"))
  }
}

impl ImageSource {
  pub fn open<P: AsRef<Path>>(path: P, looping: bool) -> Result<Self, CameraError> {
    let path = path.as_ref();
    let paths = if path.is_dir() {
      let mut paths = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
          p.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect::<Vec<_>>();
      paths.sort();
      paths
    } else if path.is_file() {
      vec![path.to_path_buf()]
    } else {
      return Err(CameraError::Open(format!("路径不存在: {}", path.display())));
    };

    if paths.is_empty() {
      return Err(CameraError::Open(format!("目录中没有图像: {}", path.display())));
    }

    info!("图像输入 {}: {} 张, 循环 {}", path.display(), paths.len(), looping);
    Ok(Self {
      paths,
      next: 0,
      looping,
    })
  }

  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }
}

impl CameraSource for ImageSource {
  type Error = CameraError;

  fn read(&mut self) -> Result<RgbImage, Self::Error> {
    if self.next >= self.paths.len() {
      if !self.looping {
        return Err(CameraError::EndOfStream);
      }
      self.next = 0;
    }
    let path = &self.paths[self.next];
    self.next += 1;
    Ok(ImageReader::open(path)?.decode()?.to_rgb8())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("shouyu-image-source-{:016x}", fastrand::u64(..)));
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  fn write_png(path: &Path, shade: u8) {
    RgbImage::from_pixel(4, 3, image::Rgb([shade, shade, shade]))
      .save(path)
      .unwrap();
  }

  #[test]
  fn directory_is_read_in_name_order() {
    let dir = scratch_dir();
    write_png(&dir.join("b.png"), 20);
    write_png(&dir.join("a.png"), 10);
    std::fs::write(dir.join("notes.txt"), "skip").unwrap();

    let mut source = ImageSource::open(&dir, false).unwrap();
    assert_eq!(source.len(), 2);
    assert_eq!(source.read().unwrap().get_pixel(0, 0)[0], 10);
    assert_eq!(source.read().unwrap().get_pixel(0, 0)[0], 20);
    assert!(matches!(source.read(), Err(CameraError::EndOfStream)));

    std::fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn looping_restarts() {
    let dir = scratch_dir();
    let file = dir.join("only.png");
    write_png(&file, 7);

    let url = Url::parse(&format!("image://{}?loop", file.display())).unwrap();
    let mut source = ImageSource::from_url(&url).unwrap();
    for _ in 0..3 {
      assert_eq!(source.read().unwrap().dimensions(), (4, 3));
    }

    std::fs::remove_dir_all(dir).unwrap();
  }

  #[test]
  fn missing_path_fails_to_open() {
    assert!(matches!(
      ImageSource::open("/definitely/not/here.png", false),
      Err(CameraError::Open(_))
    ));
  }
}
