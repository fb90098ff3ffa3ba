// 该文件是 Wangshan （望山） 项目的一部分。
// src/media.rs - 媒体文件约束与读取
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

use std::path::Path;

use image::ImageReader;
use thiserror::Error;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: &[&str] = &["webm", "avi", "mp4", "mkv"];

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum MediaError {
  #[error("Unsupported file type: {0}")]
  UnsupportedType(String),
  #[error("File too large: {size} bytes (limit {limit})")]
  TooLarge { size: u64, limit: u64 },
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  Decode(#[from] image::ImageError),
}

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
  /// 图片文件
  Image,
  /// 视频文件
  Video,
}

impl MediaKind {
  /// 可接受的文件扩展名（小写）
  pub fn extensions(self) -> &'static [&'static str] {
    match self {
      MediaKind::Image => IMAGE_EXTENSIONS,
      MediaKind::Video => VIDEO_EXTENSIONS,
    }
  }

  /// 文件大小上限（字节）
  pub fn max_bytes(self) -> u64 {
    match self {
      MediaKind::Image => MAX_IMAGE_BYTES,
      MediaKind::Video => MAX_VIDEO_BYTES,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      MediaKind::Image => "image",
      MediaKind::Video => "video",
    }
  }

  /// 按扩展名判断文件是否属于该媒体类型
  pub fn accepts(self, path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) => {
        let ext = ext.to_lowercase();
        self.extensions().iter().any(|accepted| *accepted == ext)
      }
      None => false,
    }
  }
}

/// 检查文件类型与大小是否满足上传约束，大小与上限相等视为通过
pub fn check_file(path: &Path, kind: MediaKind) -> Result<(), MediaError> {
  if !kind.accepts(path) {
    return Err(MediaError::UnsupportedType(path.display().to_string()));
  }

  let size = std::fs::metadata(path)?.len();
  let limit = kind.max_bytes();
  if size > limit {
    return Err(MediaError::TooLarge { size, limit });
  }

  Ok(())
}

/// 已解码的图片，RGBA 排列，可直接上传为纹理
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
  pub width: u32,
  pub height: u32,
  pub rgba: Vec<u8>,
}

/// 解码图片文件为 RGBA 像素
pub fn load_image(path: &Path) -> Result<LoadedImage, MediaError> {
  let image = ImageReader::open(path)?.decode()?;
  let rgba = image.to_rgba8();
  let (width, height) = rgba.dimensions();

  Ok(LoadedImage {
    width,
    height,
    rgba: rgba.into_raw(),
  })
}
