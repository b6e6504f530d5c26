// src/ui.rs - Zone, landmark and status overlay drawing
use crate::geometry::{AbsRect, RelPoint};
use crate::layout::AbsZones;
use crate::tracking::HandLandmarks;
use eframe::egui::{self, Color32, FontId, Pos2, Rect, Rounding, Stroke, Vec2};

#[derive(Debug, Clone)]
pub struct Theme {
    pub center: Color32,
    pub left: Color32,
    pub right: Color32,
    pub armed_fill: Color32,
    pub landmark: Color32,
    pub status_text: Color32,
    pub status_background: Color32,
    pub zone_stroke: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            center: Color32::from_rgb(0, 255, 255),
            left: Color32::from_rgb(0, 255, 0),
            right: Color32::from_rgb(255, 0, 0),
            armed_fill: Color32::from_rgba_unmultiplied(0, 255, 255, 60),
            landmark: Color32::from_rgb(255, 0, 255),
            status_text: Color32::BLACK,
            status_background: Color32::from_rgba_unmultiplied(255, 255, 255, 170),
            zone_stroke: 2.0,
        }
    }
}

/// Largest size with the frame's aspect ratio that fits in `available`.
pub fn fit_frame(available: Vec2, frame_size: (u32, u32)) -> Vec2 {
    let (w, h) = (frame_size.0.max(1) as f32, frame_size.1.max(1) as f32);
    let scale = (available.x / w).min(available.y / h).max(0.0);
    Vec2::new(w * scale, h * scale)
}

/// Screen position inside the drawn frame to relative frame coordinates.
pub fn to_relative(image_rect: Rect, pos: Pos2) -> RelPoint {
    let size = image_rect.size();
    RelPoint::new(
        ((pos.x - image_rect.min.x) / size.x.max(1.0)) as f64,
        ((pos.y - image_rect.min.y) / size.y.max(1.0)) as f64,
    )
}

/// Frame pixel position to screen position inside the drawn frame.
pub fn to_screen(image_rect: Rect, frame_size: (u32, u32), x: i32, y: i32) -> Pos2 {
    let sx = image_rect.width() / frame_size.0.max(1) as f32;
    let sy = image_rect.height() / frame_size.1.max(1) as f32;
    Pos2::new(
        image_rect.min.x + x as f32 * sx,
        image_rect.min.y + y as f32 * sy,
    )
}

fn screen_rect(image_rect: Rect, frame_size: (u32, u32), r: &AbsRect) -> Rect {
    Rect::from_min_max(
        to_screen(image_rect, frame_size, r.x, r.y),
        to_screen(image_rect, frame_size, r.right(), r.bottom()),
    )
}

pub fn draw_zones(
    painter: &egui::Painter,
    theme: &Theme,
    image_rect: Rect,
    frame_size: (u32, u32),
    zones: &AbsZones,
    armed: bool,
) {
    if armed {
        painter.rect_filled(
            screen_rect(image_rect, frame_size, &zones.center),
            Rounding::ZERO,
            theme.armed_fill,
        );
    }

    for (rect, color) in [
        (&zones.center, theme.center),
        (&zones.left, theme.left),
        (&zones.right, theme.right),
    ] {
        painter.rect_stroke(
            screen_rect(image_rect, frame_size, rect),
            Rounding::ZERO,
            Stroke::new(theme.zone_stroke, color),
        );
    }
}

pub fn draw_landmarks(
    painter: &egui::Painter,
    theme: &Theme,
    image_rect: Rect,
    frame_size: (u32, u32),
    hand: &HandLandmarks,
) {
    for p in &hand.points {
        painter.circle_filled(to_screen(image_rect, frame_size, p.x, p.y), 4.0, theme.landmark);
    }
}

pub fn draw_status(painter: &egui::Painter, theme: &Theme, image_rect: Rect, text: &str) {
    let anchor = image_rect.min + Vec2::new(20.0, 20.0);
    let galley = painter.layout_no_wrap(text.to_owned(), FontId::proportional(22.0), theme.status_text);
    let background = Rect::from_min_size(anchor, galley.size()).expand(6.0);
    painter.rect_filled(background, Rounding::same(4.0), theme.status_background);
    painter.galley(anchor, galley);
}
