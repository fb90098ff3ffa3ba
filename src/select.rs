// 该文件是 Wangshan （望山） 项目的一部分。
// src/select.rs - 文件选择区
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

use egui::{Align2, FontId, Rounding, Sense, Stroke, Ui, vec2};
use rfd::FileDialog;

use crate::media::MediaKind;

pub const DROP_HINT: &str = "Drag 'n' drop file here, or click to select file";

const ZONE_WIDTH: f32 = 460.0;
const ZONE_HEIGHT: f32 = 220.0;

/// 可接受的文件类型提示
pub fn accept_hint(kind: MediaKind) -> &'static str {
  match kind {
    MediaKind::Image => "Accepted file types is .jpg, .jpeg and .png",
    MediaKind::Video => "Accepted file types is .webm, .avi, .mp4 and .mkv",
  }
}

/// 文件大小限制提示
pub fn size_hint(kind: MediaKind) -> &'static str {
  match kind {
    MediaKind::Image => "File size must be under 10mb",
    MediaKind::Video => "File size must be under 100mb",
  }
}

/// 居中绘制文件选择区，点击时返回 true
///
/// 有文件悬停在窗口上方时高亮，提示可以放开。
pub fn drop_zone(ui: &mut Ui, kind: MediaKind) -> bool {
  let drag_active = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());

  let available = ui.available_size();
  let zone = vec2(available.x.min(ZONE_WIDTH), ZONE_HEIGHT);
  ui.add_space(((available.y - zone.y) * 0.5).max(0.0));

  let mut clicked = false;
  ui.vertical_centered(|ui| {
    let (rect, response) = ui.allocate_exact_size(zone, Sense::click());
    clicked = response.clicked();
    let hovered = response.hovered() || drag_active;

    let visuals = ui.visuals();
    let (fill, stroke) = if hovered {
      (
        visuals.widgets.hovered.weak_bg_fill,
        Stroke::new(2.0, visuals.selection.stroke.color),
      )
    } else {
      (
        visuals.widgets.inactive.weak_bg_fill,
        Stroke::new(1.0, visuals.widgets.inactive.bg_stroke.color),
      )
    };
    let strong = visuals.strong_text_color();
    let weak = visuals.weak_text_color();
    let body = egui::TextStyle::Body.resolve(ui.style());

    let painter = ui.painter();
    painter.rect(rect, Rounding::same(8.0), fill, stroke);
    painter.text(
      rect.center() - vec2(0.0, 36.0),
      Align2::CENTER_CENTER,
      "⬆",
      FontId::proportional(30.0),
      strong,
    );
    painter.text(
      rect.center(),
      Align2::CENTER_CENTER,
      DROP_HINT,
      body.clone(),
      strong,
    );
    painter.text(
      rect.center() + vec2(0.0, 30.0),
      Align2::CENTER_CENTER,
      accept_hint(kind),
      body.clone(),
      weak,
    );
    painter.text(
      rect.center() + vec2(0.0, 50.0),
      Align2::CENTER_CENTER,
      size_hint(kind),
      body,
      weak,
    );
  });

  clicked
}

/// 打开系统文件选择对话框
pub fn pick_file(kind: MediaKind) -> Option<PathBuf> {
  let name = match kind {
    MediaKind::Image => "Image",
    MediaKind::Video => "Video",
  };
  FileDialog::new()
    .add_filter(name, kind.extensions())
    .pick_file()
}
