// 该文件是 Wangshan （望山） 项目的一部分。
// src/bin/predict_video.rs - 视频检测命令行
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
use tracing::info;
use url::Url;

use wangshan::media::{self, MediaKind};
use wangshan::predict::PredictClient;

/// Wangshan 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理服务地址
  #[arg(
    long,
    env = "WANGSHAN_API",
    default_value = "http://127.0.0.1:8000",
    value_name = "URL"
  )]
  pub api: Url,

  /// 输入视频路径 (*.webm, *.avi, *.mp4, *.mkv)
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,

  /// 处理结果下载路径，缺省时只打印地址
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理服务地址: {}", args.api);
  info!("输入视频: {}", args.input.display());

  media::check_file(&args.input, MediaKind::Video)?;

  let client = PredictClient::new(&args.api)?;

  info!("开始处理，视频任务可能耗时较长...");
  let now = std::time::Instant::now();
  let url = client.video(&args.input)?;
  let elapsed = now.elapsed();
  info!("处理完成，耗时: {:.2?}", elapsed);

  println!("{url}");

  if let Some(output) = args.output {
    info!("正在下载处理结果...");
    let bytes = client.download(&url, &output)?;
    info!("已下载 {} 字节到 {}", bytes, output.display());
  }

  Ok(())
}
