// 该文件是 Shouyu （手语） 项目的一部分。
// src/bin/classify_image.rs - 单张图像分类
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

use anyhow::Result;
use clap::Parser;
use image::ImageReader;
use tracing::info;

use shouyu::model::{Classifier, preprocess, registry};

/// 对整张图像做一次分类（不做手部检测）
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 分类模型: vgg, resnet, googlenet, convnext
  #[arg(value_name = "MODEL")]
  pub model: String,

  /// 权重文件所在目录
  #[arg(long, value_name = "DIR", default_value = ".")]
  pub weights_dir: PathBuf,

  /// 待分类的图像
  #[arg(long, value_name = "FILE")]
  pub image: PathBuf,

  /// 输出前 K 个结果
  #[arg(long, value_name = "K", default_value_t = 3)]
  pub top_k: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();
  let descriptor = registry::resolve(&args.model)?.with_weights_dir(&args.weights_dir);
  info!("模型: {}, 权重: {}", args.model, descriptor.weights.display());

  let classifier = Classifier::load(&descriptor)?;
  let image = ImageReader::open(&args.image)?.decode()?.to_rgb8();
  info!("图像 {}: {}x{}", args.image.display(), image.width(), image.height());

  let input = preprocess::normalize(&image, descriptor.input_width, descriptor.input_height);
  let now = std::time::Instant::now();
  let probs = classifier.classify(&input)?;
  info!("推理完成，耗时: {:.2?}", now.elapsed());

  for (rank, prediction) in probs.top_k(args.top_k).iter().enumerate() {
    info!("#{} {} {:.4}", rank + 1, prediction.label, prediction.score);
  }

  Ok(())
}
