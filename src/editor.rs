// src/editor.rs - Pointer-driven move/resize of the detection zones
use crate::geometry::{clip, is_on_border, RelPoint, RelRect};
use crate::layout::{Layout, Zone};
use tracing::{debug, info};

/// Relative distance from an edge that still counts as grabbing it.
pub const EDGE_HIT_BOX: f64 = 0.02;
pub const MIN_ZONE_SIZE: f64 = 0.05;
pub const MAX_ZONE_SIZE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Move(Zone),
    Resize(Zone),
}

/// Pointer input already converted to relative frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(RelPoint),
    Move(RelPoint),
    Up,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorModes {
    pub config: bool,
    pub resize: bool,
}

/// State of one press-drag-release cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub selected: Option<DragTarget>,
    pub anchor: Option<RelPoint>,
    pub snapshot: Option<Layout>,
}

/// Pure transition for one pointer event. Returns the next drag state and the
/// layout to display; nothing changes outside config mode.
pub fn apply_pointer_event(
    drag: DragState,
    modes: EditorModes,
    layout: &Layout,
    event: PointerEvent,
) -> (DragState, Layout) {
    if !modes.config {
        return (drag, *layout);
    }

    match event {
        PointerEvent::Down(p) => {
            let selected = hit_test(layout, p, modes.resize);
            let next = DragState {
                selected,
                anchor: Some(p),
                snapshot: Some(*layout),
            };
            (next, *layout)
        }
        PointerEvent::Move(p) => {
            let (Some(target), Some(anchor), Some(snapshot)) =
                (drag.selected, drag.anchor, drag.snapshot)
            else {
                return (drag, *layout);
            };

            let delta = p - anchor;
            let mut next = *layout;
            match target {
                DragTarget::Move(zone) => {
                    *next.zone_mut(zone) = moved(snapshot.zone(zone), delta.x, delta.y);
                }
                DragTarget::Resize(zone) => {
                    *next.zone_mut(zone) = resized(snapshot.zone(zone), delta.x, delta.y);
                }
            }
            (drag, next)
        }
        PointerEvent::Up => (DragState::default(), *layout),
    }
}

/// First zone (center, left, right) under the pointer; border proximity in
/// resize mode, containment otherwise.
pub fn hit_test(layout: &Layout, p: RelPoint, resize: bool) -> Option<DragTarget> {
    Zone::ALL.into_iter().find_map(|zone| {
        let rect = layout.zone(zone);
        if resize {
            is_on_border(p.x, p.y, rect, EDGE_HIT_BOX).then_some(DragTarget::Resize(zone))
        } else {
            rect.contains(p.x, p.y).then_some(DragTarget::Move(zone))
        }
    })
}

/// Translates the origin, keeping the whole rect inside the unit square.
pub fn moved(rect: &RelRect, dx: f64, dy: f64) -> RelRect {
    RelRect::new(
        clip(rect.x + dx, 0.0, 1.0 - rect.w),
        clip(rect.y + dy, 0.0, 1.0 - rect.h),
        rect.w,
        rect.h,
    )
}

/// Grows or shrinks from the top-left corner.
pub fn resized(rect: &RelRect, dx: f64, dy: f64) -> RelRect {
    RelRect::new(
        rect.x,
        rect.y,
        clip(rect.w + dx, MIN_ZONE_SIZE, MAX_ZONE_SIZE),
        clip(rect.h + dy, MIN_ZONE_SIZE, MAX_ZONE_SIZE),
    )
}

/// Owns the editor modes and the in-flight drag; mutates only the layout it
/// is handed.
#[derive(Debug, Default)]
pub struct ZoneEditor {
    modes: EditorModes,
    drag: DragState,
}

impl ZoneEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modes(&self) -> EditorModes {
        self.modes
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn handle_pointer(&mut self, layout: &mut Layout, event: PointerEvent) {
        let (drag, next) = apply_pointer_event(self.drag, self.modes, layout, event);
        if let (PointerEvent::Down(_), Some(target)) = (event, drag.selected) {
            match target {
                DragTarget::Move(zone) => debug!("Moving {} zone", zone.as_str()),
                DragTarget::Resize(zone) => debug!("Resizing {} zone", zone.as_str()),
            }
        }
        self.drag = drag;
        *layout = next;
    }

    /// Enters config mode in move (pan) mode. No-op when already configuring.
    pub fn enter_config(&mut self) -> bool {
        if self.modes.config {
            return false;
        }
        self.modes = EditorModes {
            config: true,
            resize: false,
        };
        info!("CONFIG-MOVE mode: drag to pan, 'r' to resize, 'p'/'o' to save");
        true
    }

    pub fn enter_resize(&mut self) -> bool {
        if !self.modes.config || self.modes.resize {
            return false;
        }
        self.modes.resize = true;
        info!("CONFIG-RESIZE mode: drag borders, 'c' to pan");
        true
    }

    pub fn exit_resize(&mut self) -> bool {
        if !self.modes.config || !self.modes.resize {
            return false;
        }
        self.modes.resize = false;
        info!("Back to CONFIG-MOVE mode: drag to pan");
        true
    }

    /// Leaves config mode entirely, dropping any drag in progress.
    pub fn exit_config(&mut self) {
        self.modes = EditorModes::default();
        self.drag = DragState::default();
    }
}
