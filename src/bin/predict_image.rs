// 该文件是 Wangshan （望山） 项目的一部分。
// src/bin/predict_image.rs - 图片检测命令行
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

use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;
use tracing::info;
use url::Url;

use wangshan::annotate::{self, Draw};
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

  /// 输入图片路径 (*.jpg, *.jpeg, *.png)
  #[arg(long, value_name = "FILE")]
  pub input: PathBuf,

  /// 输出图片路径，缺省时在输入文件旁生成
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<PathBuf>,

  /// 标签字体文件路径，缺省时只画边框
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,

  /// 同时写出逐行检测记录（txt）
  #[arg(long)]
  pub record: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("推理服务地址: {}", args.api);
  info!("输入图片: {}", args.input.display());

  media::check_file(&args.input, MediaKind::Image)?;

  let client = PredictClient::new(&args.api)?;

  info!("开始检测...");
  let now = std::time::Instant::now();
  let items = client.boxes(&args.input)?;
  let elapsed = now.elapsed();
  info!("检测完成，耗时: {:.2?}，共 {} 个目标", elapsed, items.len());

  for item in &items {
    info!(
      "  - {}: {:.2}% at ({:.4}, {:.4}, {:.4}x{:.4})",
      item.class_name,
      item.confidence * 100.0,
      item.left(),
      item.top(),
      item.width(),
      item.height()
    );
  }

  let output = match args.output {
    Some(path) => path,
    None => {
      let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
      let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
      args.input.with_file_name(format!("{stem}-boxes-{stamp}.png"))
    }
  };

  let font = args.font.as_deref().map(annotate::load_font).transpose()?;

  let mut picture = ImageReader::open(&args.input)
    .with_context(|| format!("无法打开输入图片: {}", args.input.display()))?
    .decode()
    .with_context(|| format!("无法解码输入图片: {}", args.input.display()))?
    .to_rgb8();

  Draw::new(font).draw_boxes_on_image(&mut picture, &items);
  picture
    .save(&output)
    .with_context(|| format!("无法保存输出图片: {}", output.display()))?;
  info!("输出图片: {}", output.display());

  if args.record {
    annotate::write_record(&items, &output)?;
    info!("检测记录: {}", output.with_extension("txt").display());
  }

  Ok(())
}
