// Lists cameras and checks that one index delivers frames.
#[path = "../video.rs"]
mod video;

use clap::Parser;
use nokhwa::utils::ApiBackend;
use std::time::Duration;

use video::{default_camera_index, CaptureOptions, VideoSource};

#[derive(Parser, Debug)]
#[command(name = "camera_probe", about = "Check that a camera delivers frames")]
struct ProbeArgs {
    /// Camera index to probe (platform default when omitted)
    index: Option<u32>,

    /// Seconds to keep retrying before giving up
    #[arg(long, default_value_t = 1.0)]
    retry_secs: f64,
}

impl ProbeArgs {
    fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            index: self.index.unwrap_or_else(default_camera_index),
            resolution: None,
            retry: Duration::try_from_secs_f64(self.retry_secs).unwrap_or(Duration::ZERO),
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let opts = ProbeArgs::parse().capture_options();

    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => {
            println!("Found {} camera(s):", cameras.len());
            for camera in &cameras {
                println!("  [{}] {}", camera.index(), camera.human_name());
            }
        }
        Err(e) => println!("Failed to query cameras: {}", e),
    }

    println!("\nProbing camera {}...", opts.index);
    match VideoSource::open(&opts) {
        Ok(mut source) => match source.read_frame() {
            Ok(frame) => println!("✓ Frame captured: {}x{}", frame.width(), frame.height()),
            Err(e) => {
                println!("✗ Failed to capture frame: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            println!("✗ {}", e);
            std::process::exit(1);
        }
    }
}
