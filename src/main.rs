// 该文件是 Shouyu （手语） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shouyu::{
  FromUrl,
  input::InputWrapper,
  landmark::DetectorWrapper,
  model::Classifier,
  output::{OutputWrapper, draw::Draw},
  task::{CancelSignal, RecognitionTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let config = args::Args::parse().into_config()?;
  config.log();

  info!("正在加载分类模型...");
  let classifier = Classifier::load(&config.descriptor)?;

  let cancel = CancelSignal::install_ctrlc()?;

  let detector = DetectorWrapper::from_url(&config.landmarks)?;
  let camera = InputWrapper::from_url(&config.input)?;
  let output = OutputWrapper::from_url(&config.output)?.with_draw(Draw::from_font_path(&config.font));

  let (width, height) = (
    config.descriptor.input_width,
    config.descriptor.input_height,
  );
  RecognitionTask::default()
    .with_input_size(width, height)
    .with_frame_number(config.frame_number)
    .with_cancel_signal(cancel)
    .run_task(camera, detector, classifier, output)?;

  Ok(())
}
