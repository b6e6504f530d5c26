// src/video.rs - Virtual camera capture with a bounded open/retry window
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
};
use nokhwa::Camera;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

const RETRY_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(
        "could not get a valid frame from camera {index} within {waited:?}: {reason}\n\
         Launch OBS and press 'Start Virtual Camera', then re-run."
    )]
    Unavailable {
        index: u32,
        waited: Duration,
        reason: String,
    },
    #[error("failed to read frame: {0}")]
    Frame(String),
}

/// Default virtual camera index for the current platform.
pub fn default_camera_index() -> u32 {
    if cfg!(target_os = "linux") {
        2
    } else if cfg!(target_os = "windows") {
        1
    } else {
        0
    }
}

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub index: u32,
    /// Requested resolution; `None` keeps the camera's native format.
    pub resolution: Option<(u32, u32)>,
    pub retry: Duration,
}

pub struct VideoSource {
    camera: Camera,
    index: u32,
}

impl VideoSource {
    /// Opens the camera and insists on one decoded frame before accepting it,
    /// polling until `retry` has elapsed.
    pub fn open(opts: &CaptureOptions) -> Result<Self, CaptureError> {
        let started = Instant::now();
        loop {
            match Self::try_open(opts) {
                Ok(source) => {
                    let (w, h) = source.resolution();
                    info!("Opened camera {} at {}x{}", opts.index, w, h);
                    return Ok(source);
                }
                Err(reason) => {
                    let waited = started.elapsed();
                    if waited >= opts.retry {
                        return Err(CaptureError::Unavailable {
                            index: opts.index,
                            waited,
                            reason,
                        });
                    }
                    debug!("Camera {} not ready ({}), retrying", opts.index, reason);
                    std::thread::sleep(RETRY_INTERVAL);
                }
            }
        }
    }

    fn try_open(opts: &CaptureOptions) -> Result<Self, String> {
        let format = match opts.resolution {
            Some((w, h)) => RequestedFormatType::Closest(CameraFormat::new(
                Resolution::new(w, h),
                FrameFormat::MJPEG,
                30,
            )),
            None => RequestedFormatType::AbsoluteHighestFrameRate,
        };
        let requested = RequestedFormat::new::<RgbFormat>(format);

        let mut camera = Camera::new(CameraIndex::Index(opts.index), requested)
            .map_err(|e| format!("failed to open camera: {}", e))?;
        camera
            .open_stream()
            .map_err(|e| format!("failed to open stream: {}", e))?;

        let mut source = Self {
            camera,
            index: opts.index,
        };
        let probe = source.read_frame().map_err(|e| e.to_string())?;
        if probe.width() == 0 || probe.height() == 0 {
            return Err("camera delivered an empty frame".to_string());
        }
        Ok(source)
    }

    pub fn resolution(&self) -> (u32, u32) {
        let res = self.camera.resolution();
        (res.width(), res.height())
    }

    /// Next decoded frame, unmirrored.
    pub fn read_frame(&mut self) -> Result<RgbImage, CaptureError> {
        let frame = self
            .camera
            .frame()
            .map_err(|e| CaptureError::Frame(e.to_string()))?;
        frame
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Frame(e.to_string()))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            warn!("Failed to stop camera {}: {}", self.index, e);
        } else {
            info!("Released camera {}", self.index);
        }
    }
}
