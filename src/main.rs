// src/main.rs
mod app;
mod args;
mod controller;
mod detector;
mod editor;
mod geometry;
mod keys;
mod layout;
mod tracking;
mod ui;
mod video;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use tracing::{info, warn};

use app::{AppSettings, SlideGestureApp, WINDOW_TITLE};
use controller::Controller;
use detector::{HandDetector, MediaPipeWrapper};
use keys::{EnigoKeys, KeySink};
use layout::{Layout, LayoutStore};
use tracking::RecognizerConfig;
use video::{CaptureOptions, VideoSource};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let settings = AppSettings::from(args::Args::parse());

    let store = LayoutStore::new(&settings.layout_dir);
    let loaded = store
        .load(settings.layout_path.as_deref())
        .context("Could not load the layout")?;
    let active_path = settings
        .layout_path
        .clone()
        .unwrap_or_else(|| store.last_used_path());

    // Only force a resolution when the default layout will be built from it
    let capture = CaptureOptions {
        index: settings.camera_index,
        resolution: loaded.is_none().then_some(settings.requested_size),
        retry: settings.camera_retry,
    };
    let video = VideoSource::open(&capture)?;

    let layout = loaded.unwrap_or_else(|| {
        info!("No saved layout found, using defaults");
        let (w, h) = settings.requested_size;
        Layout::default_for(w, h)
    });

    let detector: Option<Box<dyn HandDetector>> =
        match MediaPipeWrapper::spawn(&settings.detector_command, settings.min_detection_confidence) {
            Ok(d) => Some(Box::new(d)),
            Err(e) => {
                warn!("{}; running without hand detection", e);
                None
            }
        };

    let keys: Option<Box<dyn KeySink>> = match EnigoKeys::new() {
        Ok(k) => Some(Box::new(k)),
        Err(e) => {
            warn!("{:#}; slide key presses disabled", e);
            None
        }
    };

    let controller = Controller::new(
        layout,
        store,
        active_path,
        RecognizerConfig {
            timeout: settings.gesture_timeout,
        },
    );

    let (width, height) = video.resolution();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([width as f32, height as f32]),
        ..Default::default()
    };

    info!("Tracking started: 'c' config, 'q' quit");
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(move |_cc| {
            Box::new(SlideGestureApp::new(controller, video, detector, keys))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Error running application: {}", e))
}
