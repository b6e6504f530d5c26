// src/args.rs - Command line options
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "slide_gesture",
    version,
    about = "Swipe your index finger from the center zone to change slides"
)]
pub struct Args {
    /// Layout file to load; falls back to last_config.json when missing
    pub layout: Option<PathBuf>,

    /// Directory for saved layouts and last_config.json
    #[arg(long, default_value = ".")]
    pub layout_dir: PathBuf,

    /// Camera index of the virtual camera (platform default when omitted)
    #[arg(long)]
    pub camera: Option<u32>,

    /// Seconds to keep retrying the camera before giving up
    #[arg(long, default_value_t = 1.0)]
    pub camera_retry_secs: f64,

    /// Requested capture width when no layout exists yet
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Requested capture height when no layout exists yet
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Command that runs the MediaPipe hand detector helper
    #[arg(long, default_value = "python3 hand_detect.py")]
    pub detector: String,

    #[arg(long, default_value_t = 0.8)]
    pub min_detection_confidence: f32,

    /// Seconds an armed gesture waits for a left/right exit
    #[arg(long, default_value_t = 5.0)]
    pub gesture_timeout_secs: f64,
}
