// 该文件是 Wangshan （望山） 项目的一部分。
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

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use wangshan::app::{APP_TITLE, DetectorApp};
use wangshan::predict::PredictClient;

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("推理服务地址: {}", args.api);
  info!("消息自动关闭时间: {}ms", args.auto_hide_ms);

  let client = PredictClient::new(&args.api)?;
  let auto_hide = Duration::from_millis(args.auto_hide_ms);

  let options = eframe::NativeOptions {
    viewport: egui::ViewportBuilder::default()
      .with_inner_size([1100.0, 760.0])
      .with_min_inner_size([640.0, 480.0]),
    ..Default::default()
  };

  eframe::run_native(
    APP_TITLE,
    options,
    Box::new(move |cc| Ok(Box::new(DetectorApp::new(cc, client, auto_hide)))),
  )
  .map_err(|e| anyhow::anyhow!("窗口启动失败: {e}"))?;

  Ok(())
}
