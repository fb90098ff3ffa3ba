// 该文件是 Wangshan （望山） 项目的一部分。
// src/annotate.rs - 检测结果落盘标注
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

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use thiserror::Error;

use crate::boxes::{self, DetectionBox};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BORDER_THICKNESS: i32 = 3;

#[derive(Debug, Error)]
pub enum AnnotateError {
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Font loading error: invalid font data")]
  InvalidFont,
}

/// 从文件加载标注字体
pub fn load_font(path: &Path) -> Result<FontVec, AnnotateError> {
  let data = std::fs::read(path)?;
  FontVec::try_from_vec(data).map_err(|_| AnnotateError::InvalidFont)
}

/// 把检测框画回原始图片，颜色按类别取自服务返回的首个框
pub struct Draw {
  font: Option<FontVec>,
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
}

impl Draw {
  pub fn new(font: Option<FontVec>) -> Self {
    Self {
      font,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
    }
  }

  pub fn draw_boxes_on_image(&self, image: &mut RgbImage, items: &[DetectionBox]) {
    let colors = boxes::class_colors(items);
    for item in items {
      let color = colors
        .get(&item.class_name)
        .copied()
        .unwrap_or([0, 0, 255]);
      self.draw_box_with_label(image, item, color);
    }
  }

  // 在图像上绘制一个矩形边框，坐标是归一化的 [left, top, width, height]
  fn draw_box_with_label(&self, image: &mut RgbImage, item: &DetectionBox, color: [u8; 3]) {
    let (w, h) = (image.width() as f32, image.height() as f32);

    let mut x_min = (item.left() * w).floor() as i32;
    let mut y_min = (item.top() * h).floor() as i32;
    let mut x_max = ((item.left() + item.width()) * w).ceil() as i32;
    let mut y_max = ((item.top() + item.height()) * h).ceil() as i32;

    // Clamp to image bounds
    x_min = x_min.clamp(0, w as i32 - 1);
    y_min = y_min.clamp(0, h as i32 - 1);
    x_max = x_max.clamp(0, w as i32 - 1);
    y_max = y_max.clamp(0, h as i32 - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    // 绘制边框（加粗为3像素）
    for thickness in 0..BORDER_THICKNESS {
      let x_min_t = (x_min + thickness).min(w as i32 - 1);
      let y_min_t = (y_min + thickness).min(h as i32 - 1);
      let x_max_t = (x_max - thickness).max(0);
      let y_max_t = (y_max - thickness).max(0);

      // Top and bottom edges
      for x in x_min_t..=x_max_t {
        if y_min_t >= 0 && (y_min_t as u32) < image.height() && (x as u32) < image.width() {
          let top = image.get_pixel_mut(x as u32, y_min_t as u32);
          *top = Rgb(color);
        }
        if y_max_t >= 0 && (y_max_t as u32) < image.height() && (x as u32) < image.width() {
          let bottom = image.get_pixel_mut(x as u32, y_max_t as u32);
          *bottom = Rgb(color);
        }
      }

      // Left and right edges
      for y in y_min_t..=y_max_t {
        if x_min_t >= 0 && (x_min_t as u32) < image.width() && (y as u32) < image.height() {
          let left = image.get_pixel_mut(x_min_t as u32, y as u32);
          *left = Rgb(color);
        }
        if x_max_t >= 0 && (x_max_t as u32) < image.width() && (y as u32) < image.height() {
          let right = image.get_pixel_mut(x_max_t as u32, y as u32);
          *right = Rgb(color);
        }
      }
    }

    // 没有字体时只画边框
    let Some(font) = &self.font else {
      return;
    };

    // 创建标签文本
    let label = format!("{} {:.2}", item.class_name, item.confidence);

    // 文本参数
    let scale = PxScale::from(self.font_size);
    let text_color = Rgb([255u8, 255u8, 255u8]); // 白色文本

    // 估算文本大小（粗略估计）
    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let text_height = self.label_text_height;

    // 确定标签背景位置（在边框上方）
    let label_x = x_min.max(0);
    let label_y = (y_min - text_height).max(0);

    // 确保标签不超出图像边界
    let max_width = (w as i32 - label_x).max(0);
    let label_width = text_width.min(max_width) as u32;
    let label_height = text_height as u32;

    // 仅在标签有空间时绘制
    if label_width > 0 && label_height > 0 {
      // 绘制标签背景
      let rect = imageproc::rect::Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, Rgb(color));

      // 绘制文本
      draw_text_mut(
        image,
        text_color,
        label_x,
        label_y + self.label_text_vertical_padding,
        scale,
        font,
        &label,
      );
    }
  }
}

/// 按行写出检测记录，扩展名固定替换为 txt
pub fn write_record(items: &[DetectionBox], path: &Path) -> Result<(), std::io::Error> {
  let mut records = Vec::new();
  for item in items {
    let record = format!(
      "{}, {:.4}, {:.4}, {:.4}, {:.4}, {:.4}",
      item.class_name,
      item.confidence,
      item.left(),
      item.top(),
      item.width(),
      item.height()
    );
    records.push(record);
  }
  std::fs::write(path.with_extension("txt"), records.join("\n"))?;
  Ok(())
}
