// 该文件是 Wangshan （望山） 项目的一部分。
// src/boxes.rs - 检测框数据与派生视图
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

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// 服务端返回的单个检测框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBox {
  /// 类别名称
  pub class_name: String,
  /// 置信度 (0.0 - 1.0)
  pub confidence: f32,
  /// 边框颜色 [r, g, b]
  pub color: [u8; 3],
  /// 归一化坐标 [left, top, width, height]，均为媒体尺寸的比例
  pub coordinates: [f32; 4],
}

impl DetectionBox {
  pub fn left(&self) -> f32 {
    self.coordinates[0]
  }

  pub fn top(&self) -> f32 {
    self.coordinates[1]
  }

  pub fn width(&self) -> f32 {
    self.coordinates[2]
  }

  pub fn height(&self) -> f32 {
    self.coordinates[3]
  }
}

/// 类别到边框颜色的映射，同一类别以首次出现的颜色为准
pub fn class_colors(boxes: &[DetectionBox]) -> BTreeMap<String, [u8; 3]> {
  let mut colors = BTreeMap::new();
  for item in boxes {
    colors.entry(item.class_name.clone()).or_insert(item.color);
  }
  colors
}

/// 结果中出现的类别，去重后按字典序排列
pub fn filter_options(boxes: &[DetectionBox]) -> Vec<String> {
  let names: BTreeSet<&str> = boxes.iter().map(|item| item.class_name.as_str()).collect();
  names.into_iter().map(str::to_string).collect()
}

/// 按类别过滤检测框，选中集合为空时不过滤
pub fn filtered<'a>(
  boxes: &'a [DetectionBox],
  filter: &BTreeSet<String>,
) -> Vec<&'a DetectionBox> {
  if filter.is_empty() {
    return boxes.iter().collect();
  }
  boxes
    .iter()
    .filter(|item| filter.contains(&item.class_name))
    .collect()
}

/// 首字母大写
pub fn capitalized(name: &str) -> String {
  let mut chars = name.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// 悬浮提示文本，例如 "Person: 87.65%"
pub fn tooltip_text(item: &DetectionBox) -> String {
  format!(
    "{}: {:.2}%",
    capitalized(&item.class_name),
    item.confidence * 100.0
  )
}
