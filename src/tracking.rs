// src/tracking.rs - Single-hand arm/release gesture recognizer
use crate::layout::AbsZones;
use nalgebra::Point2;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// MediaPipe hand landmark indices used by the recognizer.
pub mod landmarks {
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
    pub const COUNT: usize = 21;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    fn tip(self) -> usize {
        match self {
            Self::Index => landmarks::INDEX_FINGER_TIP,
            Self::Middle => landmarks::MIDDLE_FINGER_TIP,
            Self::Ring => landmarks::RING_FINGER_TIP,
            Self::Pinky => landmarks::PINKY_TIP,
        }
    }

    fn pip(self) -> usize {
        match self {
            Self::Index => landmarks::INDEX_FINGER_PIP,
            Self::Middle => landmarks::MIDDLE_FINGER_PIP,
            Self::Ring => landmarks::RING_FINGER_PIP,
            Self::Pinky => landmarks::PINKY_PIP,
        }
    }
}

/// Keypoints of one hand in frame pixels, indexed like MediaPipe's model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandLandmarks {
    pub points: Vec<Point2<i32>>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self { points }
    }

    pub fn point(&self, index: usize) -> Option<Point2<i32>> {
        self.points.get(index).copied()
    }

    pub fn index_tip(&self) -> Option<Point2<i32>> {
        self.point(landmarks::INDEX_FINGER_TIP)
    }

    /// Tip above its PIP joint in image coordinates. `None` if either is missing.
    pub fn finger_extended(&self, finger: Finger) -> Option<bool> {
        let tip = self.point(finger.tip())?;
        let pip = self.point(finger.pip())?;
        Some(tip.y < pip.y)
    }

    /// `None` when any of the four fingers cannot be evaluated.
    pub fn only_index_extended(&self) -> Option<bool> {
        let index = self.finger_extended(Finger::Index)?;
        let middle = self.finger_extended(Finger::Middle)?;
        let ring = self.finger_extended(Finger::Ring)?;
        let pinky = self.finger_extended(Finger::Pinky)?;
        Some(index && !(middle || ring || pinky))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideAction {
    PreviousSlide,
    NextSlide,
}

impl SlideAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreviousSlide => "PREVIOUS_SLIDE",
            Self::NextSlide => "NEXT_SLIDE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    pub timeout: Duration,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    pub armed_since: Option<Instant>,
}

impl GestureState {
    pub fn is_armed(&self) -> bool {
        self.armed_since.is_some()
    }
}

pub struct GestureRecognizer {
    config: RecognizerConfig,
    state: GestureState,
}

impl GestureRecognizer {
    pub fn new(config: RecognizerConfig) -> Self {
        Self {
            config,
            state: GestureState::default(),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_armed()
    }

    pub fn reset(&mut self) {
        self.state = GestureState::default();
    }

    /// Feeds one frame. Returns the slide action resolved on this frame, if
    /// any. A frame without a hand leaves the state untouched; a hand whose
    /// finger pattern cannot be read cancels an armed gesture.
    pub fn update(
        &mut self,
        hand: Option<&HandLandmarks>,
        zones: &AbsZones,
        now: Instant,
    ) -> Option<SlideAction> {
        let hand = hand?;

        let tip = hand.index_tip();
        let pointing = match (hand.only_index_extended(), tip) {
            (Some(only_index), Some(_)) => only_index,
            _ => {
                debug!("Incomplete hand landmarks ({} points)", hand.points.len());
                false
            }
        };

        if let (false, true, Some(t)) = (self.is_armed(), pointing, tip) {
            if zones.center.contains(t.x, t.y) {
                self.state.armed_since = Some(now);
                info!("Index in CENTER: gesture armed");
            }
        }

        let since = self.state.armed_since?;

        if !pointing {
            info!("Gesture cancelled (hand closed or several fingers up)");
            self.reset();
            return None;
        }
        if now.duration_since(since) > self.config.timeout {
            info!("Gesture timed out");
            self.reset();
            return None;
        }

        let t = tip?;
        let action = if zones.left.contains(t.x, t.y) {
            SlideAction::PreviousSlide
        } else if zones.right.contains(t.x, t.y) {
            SlideAction::NextSlide
        } else {
            return None;
        };

        info!("Slide gesture resolved: {}", action.as_str());
        self.reset();
        Some(action)
    }
}
