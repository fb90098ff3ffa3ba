// 该文件是 Wangshan （望山） 项目的一部分。
// src/notify.rs - 应用内消息通知
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

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

/// 消息默认展示时长
pub const DEFAULT_AUTO_HIDE: Duration = Duration::from_millis(2000);
/// 消息退场动画时长，退场结束前消息仍在队首
pub const EXIT_DURATION: Duration = Duration::from_millis(200);

/// 消息严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Info,
  Success,
  Warning,
  Error,
}

/// 一条待展示的消息
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
  pub text: String,
  pub severity: Severity,
  /// 是否显示手动关闭按钮
  pub close_button: bool,
  /// 可选动作按钮文字，点击后关闭消息
  pub action: Option<String>,
}

/// 发送消息时的可选项
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
  pub close_button: bool,
  pub action: Option<String>,
}

/// 消息关闭原因，点击空白处不关闭
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
  /// 展示时长耗尽
  Timeout,
  /// 用户点击关闭
  User,
  /// 其他（点击空白处等），忽略
  Other,
}

/// 创建一对消息发送端与接收端，接收端交给展示队列的持有者
pub fn message_channel() -> (Messenger, Receiver<Message>) {
  let (tx, rx) = channel();
  (Messenger { tx }, rx)
}

/// 消息发送端，可随意克隆后分发给需要发消息的组件
#[derive(Clone)]
pub struct Messenger {
  tx: Sender<Message>,
}

impl Messenger {
  /// 发送一条消息，接收端已关闭时静默丢弃
  pub fn show_message(&self, text: impl Into<String>, severity: Severity, options: MessageOptions) {
    let _ = self.tx.send(Message {
      text: text.into(),
      severity,
      close_button: options.close_button,
      action: options.action,
    });
  }

  pub fn show_info_message(&self, text: impl Into<String>) {
    self.show_message(text, Severity::Info, MessageOptions::default());
  }

  pub fn show_success_message(&self, text: impl Into<String>) {
    self.show_message(text, Severity::Success, MessageOptions::default());
  }

  pub fn show_warning_message(&self, text: impl Into<String>) {
    self.show_message(text, Severity::Warning, MessageOptions::default());
  }

  pub fn show_error_message(&self, text: impl Into<String>) {
    self.show_message(text, Severity::Error, MessageOptions::default());
  }
}

/// 消息展示队列，先进先出，一次只展示队首
///
/// 队首展示满时长后进入退场阶段，退场结束才出队，
/// 下一条消息随即成为队首开始展示。
pub struct Notifications {
  queue: VecDeque<Message>,
  shown_at: Option<Instant>,
  closing_since: Option<Instant>,
  auto_hide: Duration,
  exit: Duration,
}

impl Default for Notifications {
  fn default() -> Self {
    Notifications::new(DEFAULT_AUTO_HIDE)
  }
}

impl Notifications {
  pub fn new(auto_hide: Duration) -> Self {
    Notifications {
      queue: VecDeque::new(),
      shown_at: None,
      closing_since: None,
      auto_hide,
      exit: EXIT_DURATION,
    }
  }

  /// 入队一条消息
  pub fn push(&mut self, message: Message) {
    self.queue.push_back(message);
  }

  /// 当前展示中的消息（含退场阶段）
  pub fn current(&self) -> Option<&Message> {
    self.queue.front()
  }

  /// 队首是否处于退场阶段
  pub fn is_closing(&self) -> bool {
    self.closing_since.is_some()
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn is_empty(&self) -> bool {
    self.queue.is_empty()
  }

  /// 退场进度 (0.0 - 1.0)，未退场时为 None
  pub fn exit_progress(&self, now: Instant) -> Option<f32> {
    let started = self.closing_since?;
    let elapsed = now.duration_since(started).as_secs_f32();
    Some((elapsed / self.exit.as_secs_f32()).clamp(0.0, 1.0))
  }

  /// 请求关闭队首消息，只有超时与用户关闭会生效
  pub fn close(&mut self, reason: CloseReason, now: Instant) {
    if reason == CloseReason::Other {
      return;
    }
    if self.queue.is_empty() || self.closing_since.is_some() {
      return;
    }
    self.closing_since = Some(now);
  }

  /// 推进队列状态，每帧调用一次
  pub fn tick(&mut self, now: Instant) {
    if self.queue.is_empty() {
      self.shown_at = None;
      self.closing_since = None;
      return;
    }

    if let Some(started) = self.closing_since {
      if now.duration_since(started) >= self.exit {
        self.queue.pop_front();
        self.closing_since = None;
        self.shown_at = if self.queue.is_empty() {
          None
        } else {
          Some(now)
        };
      }
      return;
    }

    match self.shown_at {
      None => self.shown_at = Some(now),
      Some(shown) => {
        if now.duration_since(shown) >= self.auto_hide {
          self.close(CloseReason::Timeout, now);
        }
      }
    }
  }
}
