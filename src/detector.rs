// src/detector.rs - Hand landmark detection through a MediaPipe helper process
//
// Wire protocol with the helper:
//   startup: helper prints a single `READY` line on stdout
//   request: u32 LE width, u32 LE height, u32 LE channels, then raw RGB bytes
//   reply:   one JSON line `{"hands":[{"handedness":..,"score":..,
//            "landmarks":[{"x":..,"y":..,"z":..}, ...]}], "error": null}`
//            with x/y normalized to the frame size
use crate::geometry::{to_absolute_point, RelPoint};
use crate::tracking::{landmarks, HandLandmarks};
use image::RgbImage;
use nalgebra::Point2;
use serde::Deserialize;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("empty detector command")]
    EmptyCommand,
    #[error("failed to start hand detector `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("hand detector did not signal ready, got {0:?}")]
    NotReady(String),
    #[error("hand detector closed its pipe")]
    Closed,
    #[error("hand detector I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("unreadable hand detector reply {line:?}: {source}")]
    Reply {
        line: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Given a mirrored frame, returns the keypoints of at most one hand.
pub trait HandDetector {
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<HandLandmarks>, DetectorError>;
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f64,
    y: f64,
    #[allow(dead_code)]
    #[serde(default)]
    z: f64,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionReply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// First hand at or above `min_confidence`, scaled to frame pixels.
fn select_hand(
    reply: DetectionReply,
    min_confidence: f32,
    width: u32,
    height: u32,
) -> Option<HandLandmarks> {
    if let Some(error) = reply.error {
        warn!("Hand detector reported: {}", error);
        return None;
    }

    let hand = reply
        .hands
        .into_iter()
        .find(|h| h.score >= min_confidence)?;

    if hand.landmarks.len() != landmarks::COUNT {
        debug!(
            "Expected {} landmarks, got {}",
            landmarks::COUNT,
            hand.landmarks.len()
        );
    }
    debug!("Hand detected: {} ({:.2})", hand.handedness, hand.score);

    let points = hand
        .landmarks
        .iter()
        .map(|lm| {
            let (x, y) = to_absolute_point(&RelPoint::new(lm.x, lm.y), width, height);
            Point2::new(x, y)
        })
        .collect();
    Some(HandLandmarks::new(points))
}

pub struct MediaPipeWrapper {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_confidence: f32,
}

impl MediaPipeWrapper {
    /// Starts `command` (program followed by whitespace-separated arguments)
    /// and waits for its ready line.
    pub fn spawn(command: &str, min_confidence: f32) -> Result<Self, DetectorError> {
        let mut parts = command.split_whitespace();
        let program = parts.next().ok_or(DetectorError::EmptyCommand)?;

        info!("Starting hand detector: {}", command);
        let mut process = Command::new(program)
            .args(parts)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DetectorError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdin = process.stdin.take().ok_or(DetectorError::Closed)?;
        let stdout = process.stdout.take().ok_or(DetectorError::Closed)?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout.read_line(&mut ready)?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            return Err(DetectorError::NotReady(ready.trim().to_string()));
        }

        info!("Hand detector ready");
        Ok(Self {
            process,
            stdin,
            stdout,
            min_confidence: min_confidence.clamp(0.0, 1.0),
        })
    }
}

impl HandDetector for MediaPipeWrapper {
    fn detect(&mut self, frame: &RgbImage) -> Result<Option<HandLandmarks>, DetectorError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        self.stdin.write_all(&width.to_le_bytes())?;
        self.stdin.write_all(&height.to_le_bytes())?;
        self.stdin.write_all(&3u32.to_le_bytes())?;
        self.stdin.write_all(frame.as_raw())?;
        self.stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(DetectorError::Closed);
        }

        let reply: DetectionReply =
            serde_json::from_str(&line).map_err(|source| DetectorError::Reply {
                line: line.trim().to_string(),
                source,
            })?;
        Ok(select_hand(reply, self.min_confidence, width, height))
    }
}

impl Drop for MediaPipeWrapper {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
