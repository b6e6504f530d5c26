// src/app.rs - Frame loop: capture, detection, recognizer, editor and rendering
use crate::args::Args;
use crate::controller::{command_for_key, Command, Controller, Outcome};
use crate::detector::{DetectorError, HandDetector};
use crate::editor::PointerEvent;
use crate::keys::KeySink;
use crate::layout::{AbsZones, DEFAULT_CAMERA_SIZE};
use crate::tracking::{HandLandmarks, SlideAction};
use crate::ui::{self, Theme};
use crate::video::{default_camera_index, VideoSource};

use chrono::{DateTime, Local};
use eframe::egui;
use image::RgbImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

pub const WINDOW_TITLE: &str = "Hand Gesture Control";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub layout_path: Option<PathBuf>,
    pub layout_dir: PathBuf,
    pub camera_index: u32,
    pub camera_retry: Duration,
    pub requested_size: (u32, u32),
    pub detector_command: String,
    pub min_detection_confidence: f32,
    pub gesture_timeout: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            layout_path: None,
            layout_dir: PathBuf::from("."),
            camera_index: default_camera_index(),
            camera_retry: Duration::from_secs(1),
            requested_size: DEFAULT_CAMERA_SIZE,
            detector_command: "python3 hand_detect.py".to_string(),
            min_detection_confidence: 0.8,
            gesture_timeout: Duration::from_secs(5),
        }
    }
}

fn secs_or(value: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(fallback)
}

impl From<Args> for AppSettings {
    fn from(args: Args) -> Self {
        let defaults = Self::default();
        Self {
            layout_path: args.layout,
            layout_dir: args.layout_dir,
            camera_index: args.camera.unwrap_or(defaults.camera_index),
            camera_retry: secs_or(args.camera_retry_secs, defaults.camera_retry),
            requested_size: (args.width, args.height),
            detector_command: args.detector,
            min_detection_confidence: args.min_detection_confidence,
            gesture_timeout: secs_or(args.gesture_timeout_secs, defaults.gesture_timeout),
        }
    }
}

pub struct SlideGestureApp {
    controller: Controller,
    video: Option<VideoSource>,
    detector: Option<Box<dyn HandDetector>>,
    keys: Option<Box<dyn KeySink>>,
    theme: Theme,

    // Latest frame
    texture: Option<egui::TextureHandle>,
    frame_size: (u32, u32),
    zones: Option<AbsZones>,
    hand: Option<HandLandmarks>,

    save_prompt: Option<String>,
    last_action: Option<(SlideAction, DateTime<Local>)>,
}

impl SlideGestureApp {
    pub fn new(
        controller: Controller,
        video: VideoSource,
        detector: Option<Box<dyn HandDetector>>,
        keys: Option<Box<dyn KeySink>>,
    ) -> Self {
        let frame_size = video.resolution();
        Self {
            controller,
            video: Some(video),
            detector,
            keys,
            theme: Theme::default(),
            texture: None,
            frame_size,
            zones: None,
            hand: None,
            save_prompt: None,
            last_action: None,
        }
    }

    /// Dropping the source stops the camera stream.
    fn release_camera(&mut self) {
        self.video = None;
    }

    fn close(&mut self, ctx: &egui::Context) {
        self.release_camera();
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn process_frame(&mut self, ctx: &egui::Context) {
        let Some(video) = self.video.as_mut() else {
            return;
        };
        let frame = match video.read_frame() {
            Ok(frame) => image::imageops::flip_horizontal(&frame),
            Err(e) => {
                error!("Could not read a frame from the camera: {}", e);
                self.close(ctx);
                return;
            }
        };
        let (width, height) = frame.dimensions();
        self.frame_size = (width, height);

        self.hand = if self.controller.modes().config {
            None
        } else {
            self.detect(&frame)
        };

        let report = self
            .controller
            .step(width, height, self.hand.as_ref(), Instant::now());
        self.zones = Some(report.zones);
        if let Some(action) = report.action {
            self.send(action);
        }

        let image = egui::ColorImage::from_rgb([width as usize, height as usize], frame.as_raw());
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("camera", image, egui::TextureOptions::LINEAR))
            }
        }
    }

    fn detect(&mut self, frame: &RgbImage) -> Option<HandLandmarks> {
        let detector = self.detector.as_mut()?;
        match detector.detect(frame) {
            Ok(hand) => hand,
            Err(DetectorError::Closed) => {
                error!("Hand detector exited; gesture tracking disabled");
                self.detector = None;
                None
            }
            Err(e) => {
                warn!("Hand detection failed: {}", e);
                None
            }
        }
    }

    fn send(&mut self, action: SlideAction) {
        self.last_action = Some((action, Local::now()));
        if let Some(keys) = self.keys.as_mut() {
            if let Err(e) = keys.press(action) {
                warn!("{:#}", e);
            }
        }
    }

    fn run(&mut self, ctx: &egui::Context, command: Command) {
        match self.controller.execute(command) {
            Ok(Outcome::Quit) => {
                info!("Quit requested");
                self.close(ctx);
            }
            Ok(Outcome::PromptName) => self.save_prompt = Some(String::new()),
            Ok(Outcome::Saved(_)) | Ok(Outcome::Continue) => {}
            Err(e) => error!("Failed to save layout: {}", e),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        if self.save_prompt.is_some() {
            return;
        }
        let typed: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Text(text) => Some(text.chars().collect::<Vec<_>>()),
                    _ => None,
                })
                .flatten()
                .collect()
        });

        for key in typed {
            if let Some(command) = command_for_key(key, self.controller.modes()) {
                self.run(ctx, command);
            }
        }
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, image_rect: egui::Rect, response: &egui::Response) {
        if self.save_prompt.is_some() {
            return;
        }
        let (pressed, released, moving, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.interact_pos(),
            )
        });

        if let Some(pos) = pos {
            let p = ui::to_relative(image_rect, pos);
            if pressed && response.hovered() {
                self.controller.pointer(PointerEvent::Down(p));
            } else if moving {
                self.controller.pointer(PointerEvent::Move(p));
            }
        }
        if released {
            self.controller.pointer(PointerEvent::Up);
        }
    }

    fn show_frame(&mut self, ui: &mut egui::Ui) {
        let Some(texture_id) = self.texture.as_ref().map(|t| t.id()) else {
            ui.centered_and_justified(|ui| {
                ui.label("Waiting for camera...");
            });
            return;
        };

        let size = ui::fit_frame(ui.available_size(), self.frame_size);
        let (image_rect, response) = ui.allocate_exact_size(size, egui::Sense::click_and_drag());
        let painter = ui.painter_at(image_rect);
        painter.image(
            texture_id,
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        if let Some(zones) = &self.zones {
            ui::draw_zones(
                &painter,
                &self.theme,
                image_rect,
                self.frame_size,
                zones,
                self.controller.shows_armed(),
            );
        }
        if let Some(hand) = &self.hand {
            ui::draw_landmarks(&painter, &self.theme, image_rect, self.frame_size, hand);
        }

        if let Some(status) = self.controller.status_text() {
            ui::draw_status(&painter, &self.theme, image_rect, &status);
        } else if let Some((action, at)) = &self.last_action {
            let text = format!("{} at {}", action.as_str(), at.format("%H:%M:%S"));
            ui::draw_status(&painter, &self.theme, image_rect, &text);
        }

        self.handle_pointer(ui, image_rect, &response);
    }

    fn show_save_prompt(&mut self, ctx: &egui::Context) {
        let Some(name) = self.save_prompt.as_mut() else {
            return;
        };

        let mut submit = false;
        let mut cancel = false;
        egui::Window::new("Name this layout")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.text_edit_singleline(name).request_focus();
                ui.horizontal(|ui| {
                    submit = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        let (enter, escape) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Enter),
                i.key_pressed(egui::Key::Escape),
            )
        });

        if submit || enter {
            let name = self.save_prompt.take().unwrap_or_default();
            self.run(ctx, Command::SaveAs(name));
        } else if cancel || escape {
            self.save_prompt = None;
        }
    }
}

impl eframe::App for SlideGestureApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_frame(ctx);
        self.handle_keys(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::BLACK))
            .show(ctx, |ui| self.show_frame(ui));

        self.show_save_prompt(ctx);

        // Frames are polled, not event driven
        ctx.request_repaint();
    }
}
