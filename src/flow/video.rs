// 该文件是 Wangshan （望山） 项目的一部分。
// src/flow/video.rs - 视频检测状态机
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

use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::flow::SELECT_ERROR_MESSAGE;
use crate::media::{self, MediaKind};
use crate::notify::Messenger;
use crate::predict::extract_error_message;

/// 提交给后台的视频任务
#[derive(Debug, Clone)]
pub struct VideoRequest {
  pub generation: u64,
  pub file: PathBuf,
}

/// 后台处理完成后送回的事件
#[derive(Debug)]
pub enum VideoEvent {
  Processed {
    generation: u64,
    result: anyhow::Result<String>,
  },
}

enum VideoState {
  Idle,
  Loading { file: PathBuf },
  Result { file: PathBuf, url: String },
}

/// 视频检测状态机，成功后持有服务端处理好的视频地址
pub struct VideoFlow {
  state: VideoState,
  generation: u64,
}

impl Default for VideoFlow {
  fn default() -> Self {
    VideoFlow {
      state: VideoState::Idle,
      generation: 0,
    }
  }
}

impl VideoFlow {
  /// 选择一个视频文件，通过约束检查后进入加载态并返回后台任务
  pub fn select(&mut self, file: PathBuf, messenger: &Messenger) -> Option<VideoRequest> {
    if !matches!(self.state, VideoState::Idle) {
      return None;
    }

    if let Err(err) = media::check_file(&file, MediaKind::Video) {
      debug!("拒绝视频文件 {}: {}", file.display(), err);
      messenger.show_error_message(SELECT_ERROR_MESSAGE);
      return None;
    }

    self.generation += 1;
    info!("提交视频: {}", file.display());
    self.state = VideoState::Loading { file: file.clone() };

    Some(VideoRequest {
      generation: self.generation,
      file,
    })
  }

  /// 接收后台事件，过期事件直接丢弃
  pub fn apply(&mut self, event: VideoEvent, messenger: &Messenger) {
    let VideoEvent::Processed { generation, result } = event;
    if generation != self.generation {
      debug!("丢弃过期视频结果 (generation {})", generation);
      return;
    }
    if !matches!(self.state, VideoState::Loading { .. }) {
      return;
    }

    let VideoState::Loading { file } = std::mem::replace(&mut self.state, VideoState::Idle) else {
      return;
    };

    match result {
      Ok(url) => {
        info!("视频处理完成: {}", url);
        self.state = VideoState::Result { file, url };
      }
      Err(err) => {
        error!("视频处理失败: {:#}", err);
        messenger.show_error_message(extract_error_message(&err));
        self.generation += 1;
      }
    }
  }

  /// 回到空闲态，作废在途结果
  pub fn reset(&mut self) {
    self.generation += 1;
    self.state = VideoState::Idle;
  }

  pub fn loading(&self) -> bool {
    matches!(self.state, VideoState::Loading { .. })
  }

  /// 处理完成的视频地址
  pub fn url(&self) -> Option<&str> {
    match &self.state {
      VideoState::Result { url, .. } => Some(url),
      _ => None,
    }
  }

  pub fn file(&self) -> Option<&Path> {
    match &self.state {
      VideoState::Loading { file } => Some(file),
      VideoState::Result { file, .. } => Some(file),
      VideoState::Idle => None,
    }
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::io::Write;
  use std::sync::mpsc::Receiver;

  use tempfile::{Builder, NamedTempFile};

  use crate::media::MAX_VIDEO_BYTES;
  use crate::notify::{Message, message_channel};

  fn setup() -> (VideoFlow, Messenger, Receiver<Message>) {
    let (messenger, rx) = message_channel();
    (VideoFlow::default(), messenger, rx)
  }

  fn temp_mp4() -> NamedTempFile {
    let mut file = Builder::new().suffix(".mp4").tempfile().unwrap();
    file.write_all(b"\x00\x00\x00\x18ftypmp42").unwrap();
    file
  }

  #[test]
  fn rejects_unsupported_extension() {
    let (mut flow, messenger, rx) = setup();

    assert!(flow.select(PathBuf::from("movie.mov"), &messenger).is_none());
    assert!(!flow.loading());
    assert_eq!(rx.try_recv().unwrap().text, SELECT_ERROR_MESSAGE);
    // 只发一条
    assert!(rx.try_recv().is_err());
  }

  #[test]
  fn rejects_oversize_file() {
    let (mut flow, messenger, rx) = setup();
    let file = Builder::new().suffix(".mp4").tempfile().unwrap();
    file.as_file().set_len(MAX_VIDEO_BYTES + 1).unwrap();

    assert!(
      flow
        .select(file.path().to_path_buf(), &messenger)
        .is_none()
    );
    assert_eq!(rx.try_recv().unwrap().text, SELECT_ERROR_MESSAGE);
  }

  #[test]
  fn processed_url_reaches_result() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_mp4();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();
    assert!(flow.loading());

    flow.apply(
      VideoEvent::Processed {
        generation: request.generation,
        result: Ok("http://127.0.0.1:8000/static/out.webm".to_string()),
      },
      &messenger,
    );
    assert!(!flow.loading());
    assert_eq!(flow.url(), Some("http://127.0.0.1:8000/static/out.webm"));
  }

  #[test]
  fn failure_notifies_and_returns_to_idle() {
    let (mut flow, messenger, rx) = setup();
    let file = temp_mp4();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      VideoEvent::Processed {
        generation: request.generation,
        result: Err(anyhow::anyhow!("connection refused")),
      },
      &messenger,
    );
    assert!(!flow.loading());
    assert_eq!(flow.url(), None);
    assert_eq!(rx.try_recv().unwrap().text, "connection refused");
  }

  #[test]
  fn stale_event_after_reset_is_dropped() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_mp4();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.reset();
    flow.apply(
      VideoEvent::Processed {
        generation: request.generation,
        result: Ok("http://stale.example/out.webm".to_string()),
      },
      &messenger,
    );
    assert_eq!(flow.url(), None);
    assert!(!flow.loading());
  }

  #[test]
  fn reset_clears_result() {
    let (mut flow, messenger, _rx) = setup();
    let file = temp_mp4();
    let request = flow.select(file.path().to_path_buf(), &messenger).unwrap();

    flow.apply(
      VideoEvent::Processed {
        generation: request.generation,
        result: Ok("http://127.0.0.1:8000/static/out.webm".to_string()),
      },
      &messenger,
    );
    assert!(flow.url().is_some());

    flow.reset();
    assert_eq!(flow.url(), None);
    assert_eq!(flow.file(), None);
  }
}
