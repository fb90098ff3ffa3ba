// 该文件是 Wangshan （望山） 项目的一部分。
// src/overlay.rs - 检测框叠加绘制
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

use egui::{Color32, Rect, Rounding, Sense, Stroke, Ui, pos2, vec2};

use crate::boxes::{self, DetectionBox};

pub const BORDER_WIDTH: f32 = 3.0;
pub const FOCUSED_BORDER_WIDTH: f32 = 4.0;
const CORNER_RADIUS: f32 = 4.0;

pub fn stroke_color(color: [u8; 3]) -> Color32 {
  Color32::from_rgb(color[0], color[1], color[2])
}

/// 把归一化坐标换算成媒体显示区域内的屏幕矩形
pub fn overlay_rect(item: &DetectionBox, media: Rect) -> Rect {
  Rect::from_min_size(
    pos2(
      media.left() + item.left() * media.width(),
      media.top() + item.top() * media.height(),
    ),
    vec2(item.width() * media.width(), item.height() * media.height()),
  )
}

/// 在媒体显示区域上叠加绘制检测框
///
/// 每个框可点击获得焦点，聚焦时边框加粗，悬浮显示类别与置信度。
pub fn draw_boxes<'a>(
  ui: &mut Ui,
  media_rect: Rect,
  boxes: impl IntoIterator<Item = &'a DetectionBox>,
) {
  for (index, item) in boxes.into_iter().enumerate() {
    let rect = overlay_rect(item, media_rect);
    let id = ui.id().with(("detection", index));
    let response = ui.interact(rect, id, Sense::click());
    if response.clicked() {
      response.request_focus();
    }

    let width = if response.has_focus() {
      FOCUSED_BORDER_WIDTH
    } else {
      BORDER_WIDTH
    };
    ui.painter().rect_stroke(
      rect,
      Rounding::same(CORNER_RADIUS),
      Stroke::new(width, stroke_color(item.color)),
    );

    response.on_hover_text(boxes::tooltip_text(item));
  }
}
