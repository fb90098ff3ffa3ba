// 该文件是 Wangshan （望山） 项目的一部分。
// src/app.rs - 主界面
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
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::time::{Duration, Instant};

use egui::{Align2, Color32, RichText, Rounding, Stroke, vec2};

use crate::boxes;
use crate::flow::{ImageEvent, ImageFlow, ImageRequest, VideoEvent, VideoFlow};
use crate::media::{self, MediaKind};
use crate::notify::{CloseReason, Message, Messenger, Notifications, Severity, message_channel};
use crate::overlay;
use crate::predict::PredictClient;
use crate::select;

/// 主窗口标题
pub const APP_TITLE: &str = "Detector";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
  Image,
  Video,
}

/// 后台任务完成后经由通道送回界面线程的事件
enum AppEvent {
  Image(ImageEvent),
  Video(VideoEvent),
}

pub struct DetectorApp {
  client: Arc<PredictClient>,
  tab: Tab,
  image: ImageFlow,
  video: VideoFlow,
  events_tx: Sender<AppEvent>,
  events_rx: Receiver<AppEvent>,
  messenger: Messenger,
  inbox: Receiver<Message>,
  notifications: Notifications,
  filter_open: bool,
  // 按 generation 缓存当前结果的纹理
  texture: Option<(u64, egui::TextureHandle)>,
}

impl DetectorApp {
  pub fn new(
    cc: &eframe::CreationContext<'_>,
    client: PredictClient,
    auto_hide: Duration,
  ) -> Self {
    cc.egui_ctx.set_visuals(egui::Visuals::dark());

    let (events_tx, events_rx) = channel();
    let (messenger, inbox) = message_channel();

    DetectorApp {
      client: Arc::new(client),
      tab: Tab::Image,
      image: ImageFlow::default(),
      video: VideoFlow::default(),
      events_tx,
      events_rx,
      messenger,
      inbox,
      notifications: Notifications::new(auto_hide),
      filter_open: false,
      texture: None,
    }
  }

  /// 提交图片：检测请求与本地解码各自在独立线程上进行
  fn submit_image(&mut self, ctx: &egui::Context, file: PathBuf) {
    let Some(request) = self.image.select(file, &self.messenger) else {
      return;
    };
    self.spawn_boxes(ctx, request.clone());
    self.spawn_picture(ctx, request);
  }

  fn spawn_boxes(&self, ctx: &egui::Context, request: ImageRequest) {
    let client = Arc::clone(&self.client);
    let tx = self.events_tx.clone();
    let ctx = ctx.clone();
    std::thread::spawn(move || {
      let result = client.boxes(&request.file).map_err(anyhow::Error::new);
      let _ = tx.send(AppEvent::Image(ImageEvent::Boxes {
        generation: request.generation,
        result,
      }));
      ctx.request_repaint();
    });
  }

  fn spawn_picture(&self, ctx: &egui::Context, request: ImageRequest) {
    let tx = self.events_tx.clone();
    let ctx = ctx.clone();
    std::thread::spawn(move || {
      let result = media::load_image(&request.file).map_err(anyhow::Error::new);
      let _ = tx.send(AppEvent::Image(ImageEvent::Picture {
        generation: request.generation,
        result,
      }));
      ctx.request_repaint();
    });
  }

  fn submit_video(&mut self, ctx: &egui::Context, file: PathBuf) {
    let Some(request) = self.video.select(file, &self.messenger) else {
      return;
    };
    let client = Arc::clone(&self.client);
    let tx = self.events_tx.clone();
    let ctx = ctx.clone();
    std::thread::spawn(move || {
      let result = client.video(&request.file).map_err(anyhow::Error::new);
      let _ = tx.send(AppEvent::Video(VideoEvent::Processed {
        generation: request.generation,
        result,
      }));
      ctx.request_repaint();
    });
  }

  fn drain_events(&mut self) {
    while let Ok(event) = self.events_rx.try_recv() {
      match event {
        AppEvent::Image(event) => self.image.apply(event, &self.messenger),
        AppEvent::Video(event) => self.video.apply(event, &self.messenger),
      }
    }
    while let Ok(message) = self.inbox.try_recv() {
      self.notifications.push(message);
    }
  }

  /// 拖拽到窗口任意位置的文件按当前标签页处理
  fn handle_dropped_files(&mut self, ctx: &egui::Context) {
    let dropped: Vec<PathBuf> = ctx.input(|i| {
      i.raw
        .dropped_files
        .iter()
        .filter_map(|file| file.path.clone())
        .collect()
    });
    if let Some(file) = dropped.into_iter().next() {
      match self.tab {
        Tab::Image => self.submit_image(ctx, file),
        Tab::Video => self.submit_video(ctx, file),
      }
    }
  }

  fn active_loading(&self) -> bool {
    match self.tab {
      Tab::Image => self.image.loading(),
      Tab::Video => self.video.loading(),
    }
  }

  /// 确保当前结果的纹理已上传，按 generation 复用
  fn ensure_image_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
    let generation = self.image.generation();
    let fresh = match &self.texture {
      Some((cached, _)) => *cached == generation,
      None => false,
    };
    if !fresh {
      let picture = &self.image.result()?.picture;
      let color = egui::ColorImage::from_rgba_unmultiplied(
        [picture.width as usize, picture.height as usize],
        &picture.rgba,
      );
      let handle = ctx.load_texture("selected-image", color, egui::TextureOptions::LINEAR);
      self.texture = Some((generation, handle));
    }
    self.texture.as_ref().map(|(_, handle)| handle.clone())
  }

  fn image_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
    if self.image.result().is_none() {
      if select::drop_zone(ui, MediaKind::Image)
        && let Some(file) = select::pick_file(MediaKind::Image)
      {
        self.submit_image(ctx, file);
      }
      return;
    }

    let mut do_reset = false;
    ui.horizontal(|ui| {
      if ui.button("Filter").clicked() {
        self.filter_open = !self.filter_open;
      }
      if ui.button("Reset").clicked() {
        do_reset = true;
      }
    });
    if do_reset {
      self.image.reset();
      self.texture = None;
      self.filter_open = false;
      return;
    }

    let Some(texture) = self.ensure_image_texture(ctx) else {
      return;
    };

    ui.add_space(8.0);
    ui.vertical_centered(|ui| {
      // 不放大原图，只按可用空间缩小
      let available = ui.available_size();
      let size = texture.size_vec2();
      let scale = (available.x / size.x)
        .min(available.y / size.y)
        .min(1.0)
        .max(0.0);
      let display = size * scale;

      let response = ui.add(egui::Image::new(&texture).fit_to_exact_size(display));
      overlay::draw_boxes(ui, response.rect, self.image.visible_boxes());
    });
  }

  fn video_tab(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
    let Some(url) = self.video.url().map(str::to_string) else {
      if select::drop_zone(ui, MediaKind::Video)
        && let Some(file) = select::pick_file(MediaKind::Video)
      {
        self.submit_video(ctx, file);
      }
      return;
    };

    let mut do_reset = false;
    ui.horizontal(|ui| {
      if ui.button("Reset").clicked() {
        do_reset = true;
      }
    });
    if do_reset {
      self.video.reset();
      return;
    }

    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
      ui.label("Processed video is ready:");
      ui.hyperlink(&url);
      ui.add_space(8.0);
      if ui.button("Open in player").clicked() {
        ctx.open_url(egui::OpenUrl::new_tab(&url));
      }
    });
  }

  /// 类别过滤对话框，勾选即过滤，空选中集不过滤
  fn filter_window(&mut self, ctx: &egui::Context) {
    if !self.filter_open || self.tab != Tab::Image {
      return;
    }

    let options = boxes::filter_options(self.image.boxes());
    let colors = boxes::class_colors(self.image.boxes());
    let mut open = self.filter_open;
    let mut toggled: Option<String> = None;
    let mut close_clicked = false;

    egui::Window::new("Class filter")
      .open(&mut open)
      .collapsible(false)
      .resizable(false)
      .anchor(Align2::CENTER_CENTER, vec2(0.0, 0.0))
      .show(ctx, |ui| {
        ui.label("Selected classes");
        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
          for option in &options {
            let selected = self.image.filter().contains(option);
            let color = colors.get(option).copied().unwrap_or([255, 255, 255]);
            let chip = egui::Button::new(boxes::capitalized(option))
              .stroke(Stroke::new(2.0, overlay::stroke_color(color)))
              .selected(selected);
            if ui.add(chip).clicked() {
              toggled = Some(option.clone());
            }
          }
        });
        ui.separator();
        if ui.button("Close").clicked() {
          close_clicked = true;
        }
      });

    if let Some(name) = toggled {
      self.image.toggle_class(&name);
    }
    self.filter_open = open && !close_clicked;
  }

  fn draw_backdrop(&self, ctx: &egui::Context) {
    let screen = ctx.screen_rect();
    egui::Area::new(egui::Id::new("loading_backdrop"))
      .order(egui::Order::Foreground)
      .fixed_pos(screen.min)
      .show(ctx, |ui| {
        ui.painter()
          .rect_filled(screen, 0.0, Color32::from_black_alpha(160));
        // 挡住下层交互
        ui.interact(screen, egui::Id::new("backdrop_blocker"), egui::Sense::click());
        let rect = egui::Rect::from_center_size(screen.center(), vec2(48.0, 48.0));
        ui.put(rect, egui::Spinner::new().size(40.0));
      });
  }

  fn draw_notification(&mut self, ctx: &egui::Context) {
    let now = Instant::now();
    let Some(message) = self.notifications.current().cloned() else {
      return;
    };

    // 退场阶段淡出
    let alpha = self
      .notifications
      .exit_progress(now)
      .map(|p| 1.0 - p)
      .unwrap_or(1.0);
    let fill = severity_color(message.severity).gamma_multiply(alpha);
    let text_color = Color32::WHITE.gamma_multiply(alpha);
    let mut close_requested = false;

    egui::Area::new(egui::Id::new("notification"))
      .order(egui::Order::Tooltip)
      .anchor(Align2::CENTER_TOP, vec2(0.0, 16.0))
      .show(ctx, |ui| {
        egui::Frame::none()
          .fill(fill)
          .rounding(Rounding::same(4.0))
          .inner_margin(egui::Margin::symmetric(12.0, 8.0))
          .show(ui, |ui| {
            ui.horizontal(|ui| {
              ui.label(RichText::new(severity_icon(message.severity)).color(text_color));
              ui.label(RichText::new(&message.text).color(text_color));
              if let Some(action) = &message.action
                && ui.button(action).clicked()
              {
                close_requested = true;
              }
              if message.close_button
                && ui
                  .button(RichText::new("✖").color(text_color))
                  .clicked()
              {
                close_requested = true;
              }
            });
          });
      });

    if close_requested {
      self.notifications.close(CloseReason::User, now);
    }
  }
}

impl eframe::App for DetectorApp {
  fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
    self.drain_events();
    self.notifications.tick(Instant::now());
    self.handle_dropped_files(ctx);

    egui::TopBottomPanel::top("tab_bar").show(ctx, |ui| {
      ui.horizontal(|ui| {
        ui.selectable_value(&mut self.tab, Tab::Image, "Image");
        ui.selectable_value(&mut self.tab, Tab::Video, "Video");
      });
    });

    egui::CentralPanel::default().show(ctx, |ui| match self.tab {
      Tab::Image => self.image_tab(ui, ctx),
      Tab::Video => self.video_tab(ui, ctx),
    });

    self.filter_window(ctx);
    if self.active_loading() {
      self.draw_backdrop(ctx);
    }
    self.draw_notification(ctx);

    // 加载动画与消息计时都依赖持续重绘
    if self.active_loading() || !self.notifications.is_empty() {
      ctx.request_repaint_after(Duration::from_millis(50));
    }
  }
}

fn severity_color(severity: Severity) -> Color32 {
  match severity {
    Severity::Info => Color32::from_rgb(2, 136, 209),
    Severity::Success => Color32::from_rgb(46, 125, 50),
    Severity::Warning => Color32::from_rgb(237, 108, 2),
    Severity::Error => Color32::from_rgb(211, 47, 47),
  }
}

fn severity_icon(severity: Severity) -> &'static str {
  match severity {
    Severity::Info => "ℹ",
    Severity::Success => "✔",
    Severity::Warning => "⚠",
    Severity::Error => "✖",
  }
}
