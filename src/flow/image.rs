// 该文件是 Wangshan （望山） 项目的一部分。
// src/flow/image.rs - 图片检测状态机
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

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::boxes::{self, DetectionBox};
use crate::flow::SELECT_ERROR_MESSAGE;
use crate::media::{self, LoadedImage, MediaKind};
use crate::notify::Messenger;
use crate::predict::extract_error_message;

/// 提交给后台的图片任务，generation 用于作废过期结果
#[derive(Debug, Clone)]
pub struct ImageRequest {
  pub generation: u64,
  pub file: PathBuf,
}

/// 后台任务完成后送回的事件，检测与解码各送一条
#[derive(Debug)]
pub enum ImageEvent {
  Boxes {
    generation: u64,
    result: anyhow::Result<Vec<DetectionBox>>,
  },
  Picture {
    generation: u64,
    result: anyhow::Result<LoadedImage>,
  },
}

/// 检测与解码都完成后的展示数据
#[derive(Debug)]
pub struct ImageResult {
  pub file: PathBuf,
  pub picture: LoadedImage,
  pub boxes: Vec<DetectionBox>,
}

struct PendingImage {
  file: PathBuf,
  boxes: Option<Vec<DetectionBox>>,
  picture: Option<LoadedImage>,
}

enum ImageState {
  Idle,
  Loading(PendingImage),
  Result(ImageResult),
}

/// 图片检测状态机：空闲 -> 加载中 -> 结果
///
/// 检测请求与本地解码并行进行，两者都成功才进入结果态；
/// 任何一半失败则通知用户并回到空闲态，同时作废另一半。
pub struct ImageFlow {
  state: ImageState,
  filter: BTreeSet<String>,
  generation: u64,
}

impl Default for ImageFlow {
  fn default() -> Self {
    ImageFlow {
      state: ImageState::Idle,
      filter: BTreeSet::new(),
      generation: 0,
    }
  }
}

impl ImageFlow {
  /// 选择一个图片文件，通过约束检查后进入加载态并返回后台任务
  pub fn select(&mut self, file: PathBuf, messenger: &Messenger) -> Option<ImageRequest> {
    if !matches!(self.state, ImageState::Idle) {
      return None;
    }

    if let Err(err) = media::check_file(&file, MediaKind::Image) {
      debug!("拒绝图片文件 {}: {}", file.display(), err);
      messenger.show_error_message(SELECT_ERROR_MESSAGE);
      return None;
    }

    self.generation += 1;
    info!("提交图片: {}", file.display());
    self.state = ImageState::Loading(PendingImage {
      file: file.clone(),
      boxes: None,
      picture: None,
    });

    Some(ImageRequest {
      generation: self.generation,
      file,
    })
  }

  /// 接收后台事件，过期事件直接丢弃
  pub fn apply(&mut self, event: ImageEvent, messenger: &Messenger) {
    match event {
      ImageEvent::Boxes { generation, result } => {
        if generation != self.generation {
          debug!("丢弃过期检测结果 (generation {})", generation);
          return;
        }
        match result {
          Ok(boxes) => {
            if let ImageState::Loading(pending) = &mut self.state {
              pending.boxes = Some(boxes);
              self.try_finish();
            }
          }
          Err(err) => self.fail(err, messenger),
        }
      }
      ImageEvent::Picture { generation, result } => {
        if generation != self.generation {
          debug!("丢弃过期解码结果 (generation {})", generation);
          return;
        }
        match result {
          Ok(picture) => {
            if let ImageState::Loading(pending) = &mut self.state {
              pending.picture = Some(picture);
              self.try_finish();
            }
          }
          Err(err) => self.fail(err, messenger),
        }
      }
    }
  }

  fn try_finish(&mut self) {
    let complete = matches!(
      &self.state,
      ImageState::Loading(pending) if pending.boxes.is_some() && pending.picture.is_some()
    );
    if !complete {
      return;
    }

    if let ImageState::Loading(pending) = std::mem::replace(&mut self.state, ImageState::Idle) {
      let (Some(boxes), Some(picture)) = (pending.boxes, pending.picture) else {
        return;
      };
      info!("图片检测完成，共 {} 个目标", boxes.len());
      self.state = ImageState::Result(ImageResult {
        file: pending.file,
        picture,
        boxes,
      });
    }
  }

  fn fail(&mut self, error: anyhow::Error, messenger: &Messenger) {
    error!("图片检测失败: {:#}", error);
    messenger.show_error_message(extract_error_message(&error));
    // 作废另一半在途结果
    self.generation += 1;
    self.state = ImageState::Idle;
  }

  /// 回到空闲态，作废所有在途结果并清空过滤器
  pub fn reset(&mut self) {
    self.generation += 1;
    self.state = ImageState::Idle;
    self.filter.clear();
  }

  pub fn loading(&self) -> bool {
    matches!(self.state, ImageState::Loading(_))
  }

  pub fn result(&self) -> Option<&ImageResult> {
    match &self.state {
      ImageState::Result(result) => Some(result),
      _ => None,
    }
  }

  pub fn boxes(&self) -> &[DetectionBox] {
    match &self.state {
      ImageState::Result(result) => &result.boxes,
      _ => &[],
    }
  }

  pub fn file(&self) -> Option<&Path> {
    match &self.state {
      ImageState::Loading(pending) => Some(&pending.file),
      ImageState::Result(result) => Some(&result.file),
      ImageState::Idle => None,
    }
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  pub fn filter(&self) -> &BTreeSet<String> {
    &self.filter
  }

  /// 勾选或取消一个类别
  pub fn toggle_class(&mut self, name: &str) {
    if !self.filter.remove(name) {
      self.filter.insert(name.to_string());
    }
  }

  /// 过滤后的可见检测框
  pub fn visible_boxes(&self) -> Vec<&DetectionBox> {
    boxes::filtered(self.boxes(), &self.filter)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::io::Write;
  use std::sync::mpsc::Receiver;

  use tempfile::{Builder, NamedTempFile};

  use crate::notify::{Message, message_channel};
  use crate::predict::PredictError;

  fn setup() -> (ImageFlow, Messenger, Receiver<Message>) {
    let (messenger, rx) = message_channel();
    (ImageFlow::default(), messenger, rx)
  }

  fn temp_jpg() -> NamedTempFile {
    let mut file = Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(b"\xff\xd8\xff\xe0 not really a jpeg").unwrap();
    file
  }

  fn detection(class_name: &str) -> DetectionBox {
    DetectionBox {
      class_name: class_name.to_string(),
      confidence: 0.9,
      color: [255, 0, 0],
      coordinates: [0.1, 0.1, 0.2, 0.2],
    }
  }

  fn picture() -> LoadedImage {
    LoadedImage {
      width: 1,
      height: 1,
      rgba: vec![0, 0, 0, 255],
    }
  }

  #[test]
  fn rejecting_file_keeps_idle_and_notifies() {
    let (mut flow, messenger, rx) = setup();

    let request = flow.select(PathBuf::from("notes.txt"), &messenger);
    assert!(request.is_none());
    assert!(!flow.loading());
    assert!(flow.result().is_none());
    assert_eq!(flow.generation(), 0);

    let message = rx.try_recv().unwrap();
    assert_eq!(message.text, SELECT_ERROR_MESSAGE);
    // 只发一条
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn select_enters_loading_with_fresh_generation() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();

    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();
    assert_eq!(request.generation, 1);
    assert!(flow.loading());
    assert_eq!(flow.file(), Some(file.path()));
  }

  #[test]
  fn select_is_ignored_while_loading() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();

    flow.select(file.path().to_path_buf(), &messenger).unwrap();
    assert!(
      flow
        .select(file.path().to_path_buf(), &messenger)
        .is_none()
    );
    assert_eq!(flow.generation(), 1);
  }

  #[test]
  fn result_needs_both_halves() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Ok(vec![detection("dog"), detection("cat")]),
      },
      &messenger,
    );
    assert!(flow.loading());
    assert!(flow.result().is_none());

    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert!(!flow.loading());
    let result = flow.result().unwrap();
    assert_eq!(result.boxes.len(), 2);

    // 过滤器初始为空，即不过滤
    assert!(flow.filter().is_empty());
    assert_eq!(flow.visible_boxes().len(), 2);
  }

  #[test]
  fn halves_may_arrive_in_any_order() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert!(flow.loading());

    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Ok(vec![detection("dog")]),
      },
      &messenger,
    );
    assert!(flow.result().is_some());
  }

  #[test]
  fn failure_notifies_and_discards_sibling() {
    let (mut flow, messenger, rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    let error = anyhow::Error::new(PredictError::Status {
      status: reqwest::StatusCode::BAD_REQUEST,
      detail: Some("Type of file is wrong".to_string()),
    });
    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Err(error),
      },
      &messenger,
    );

    assert!(!flow.loading());
    assert!(flow.result().is_none());
    assert_eq!(rx.try_recv().unwrap().text, "Type of file is wrong");

    // 迟到的另一半已过期，不得复活任何状态
    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert!(!flow.loading());
    assert!(flow.result().is_none());
  }

  #[test]
  fn reset_discards_inflight_results() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.reset();
    assert!(!flow.loading());

    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Ok(vec![detection("dog")]),
      },
      &messenger,
    );
    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert!(flow.result().is_none());
  }

  #[test]
  fn reset_clears_filter_and_result() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Ok(vec![detection("dog")]),
      },
      &messenger,
    );
    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert!(flow.result().is_some());

    flow.reset();
    assert!(flow.result().is_none());
    assert!(flow.filter().is_empty());
    assert_eq!(flow.boxes().len(), 0);
  }

  #[test]
  fn toggling_classes_changes_visibility() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      ImageEvent::Boxes {
        generation: request.generation,
        result: Ok(vec![detection("dog"), detection("cat"), detection("dog")]),
      },
      &messenger,
    );
    flow.apply(
      ImageEvent::Picture {
        generation: request.generation,
        result: Ok(picture()),
      },
      &messenger,
    );
    assert_eq!(flow.visible_boxes().len(), 3);

    // 选中 dog 后只显示 dog
    flow.toggle_class("dog");
    let visible = flow.visible_boxes();
    assert_eq!(visible.len(), 2);
    assert!(visible.iter().all(|item| item.class_name == "dog"));

    flow.toggle_class("cat");
    assert_eq!(flow.visible_boxes().len(), 3);

    // 取消所有选中回到不过滤
    flow.toggle_class("dog");
    flow.toggle_class("cat");
    assert_eq!(flow.visible_boxes().len(), 3);

    flow.toggle_class("cat");
    let visible = flow.visible_boxes();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].class_name, "cat");
  }

  #[test]
  fn each_select_bumps_generation() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_jpg();

    let first = flow.select(file.path().to_path_buf(), &messenger).unwrap();
    assert_eq!(first.generation, 1);
    flow.reset();

    let second = flow.select(file.path().to_path_buf(), &messenger).unwrap();
    assert!(second.generation > first.generation);
  }
}
