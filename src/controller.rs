// src/controller.rs - Application state and mode switching for the frame loop
use crate::editor::{EditorModes, PointerEvent, ZoneEditor};
use crate::layout::{AbsZones, Layout, LayoutError, LayoutStore};
use crate::tracking::{GestureRecognizer, HandLandmarks, RecognizerConfig, SlideAction};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

const DEFAULT_SAVE_NAME: &str = "layout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    EnterConfig,
    EnterResize,
    ExitResize,
    /// Ask the operator for a layout name.
    BeginSaveAs,
    SaveAs(String),
    Overwrite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    PromptName,
    Saved(PathBuf),
    Quit,
}

/// Single-key bindings. `c` is overloaded: it enters config mode from
/// tracking and returns to move mode from resize mode.
pub fn command_for_key(key: char, modes: EditorModes) -> Option<Command> {
    match key.to_ascii_lowercase() {
        'q' => Some(Command::Quit),
        'c' if !modes.config => Some(Command::EnterConfig),
        'c' if modes.resize => Some(Command::ExitResize),
        'r' if modes.config && !modes.resize => Some(Command::EnterResize),
        'p' if modes.config => Some(Command::BeginSaveAs),
        'o' if modes.config => Some(Command::Overwrite),
        _ => None,
    }
}

/// Per-frame result handed back to the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub zones: AbsZones,
    pub action: Option<SlideAction>,
}

pub struct Controller {
    layout: Layout,
    editor: ZoneEditor,
    recognizer: GestureRecognizer,
    store: LayoutStore,
    active_path: PathBuf,
}

impl Controller {
    pub fn new(
        layout: Layout,
        store: LayoutStore,
        active_path: PathBuf,
        recognizer: RecognizerConfig,
    ) -> Self {
        Self {
            layout,
            editor: ZoneEditor::new(),
            recognizer: GestureRecognizer::new(recognizer),
            store,
            active_path,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn modes(&self) -> EditorModes {
        self.editor.modes()
    }

    pub fn is_armed(&self) -> bool {
        self.recognizer.is_armed()
    }

    /// Whether the armed highlight should be drawn. A gesture armed before
    /// entering config mode stays armed but is not shown while editing.
    pub fn shows_armed(&self) -> bool {
        self.is_armed() && !self.modes().config
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    /// Rebuilds the pixel zones for this frame and, in tracking mode, runs
    /// the recognizer on the detected hand.
    pub fn step(
        &mut self,
        width: u32,
        height: u32,
        hand: Option<&HandLandmarks>,
        now: Instant,
    ) -> FrameReport {
        let zones = self.layout.to_absolute(width, height);
        let action = if self.modes().config {
            None
        } else {
            self.recognizer.update(hand, &zones, now)
        };
        FrameReport { zones, action }
    }

    pub fn pointer(&mut self, event: PointerEvent) {
        self.editor.handle_pointer(&mut self.layout, event);
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, LayoutError> {
        let modes = self.modes();
        let outcome = match command {
            Command::Quit => Outcome::Quit,
            Command::EnterConfig => {
                self.editor.enter_config();
                Outcome::Continue
            }
            Command::EnterResize => {
                self.editor.enter_resize();
                Outcome::Continue
            }
            Command::ExitResize => {
                self.editor.exit_resize();
                Outcome::Continue
            }
            Command::BeginSaveAs if modes.config => Outcome::PromptName,
            Command::SaveAs(name) if modes.config => {
                let name = match name.trim() {
                    "" => DEFAULT_SAVE_NAME,
                    trimmed => trimmed,
                };
                let path = self.store.persist(&self.layout, Path::new(name), false)?;
                self.finish_save(path)
            }
            Command::Overwrite if modes.config => {
                let path = self.store.persist(&self.layout, &self.active_path, true)?;
                self.finish_save(path)
            }
            Command::BeginSaveAs | Command::SaveAs(_) | Command::Overwrite => Outcome::Continue,
        };
        Ok(outcome)
    }

    fn finish_save(&mut self, path: PathBuf) -> Outcome {
        self.active_path = path.clone();
        self.editor.exit_config();
        info!("Saved as {}, tracking resumed", path.display());
        Outcome::Saved(path)
    }

    /// Overlay text for config mode.
    pub fn status_text(&self) -> Option<String> {
        let modes = self.modes();
        if !modes.config {
            return None;
        }
        let (mode, hint) = if modes.resize {
            ("RESIZE", "drag borders | c: pan | ")
        } else {
            ("MOVE", "drag to pan | r: resize | ")
        };
        Some(format!(
            "CONFIG ({}) {}p: save as | o: overwrite | q: quit",
            mode, hint
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{RelPoint, RelRect};
    use nalgebra::Point2;
    use std::time::Duration;

    fn layout() -> Layout {
        Layout {
            center: RelRect::new(0.4, 0.4, 0.2, 0.2),
            left: RelRect::new(0.05, 0.4, 0.1, 0.2),
            right: RelRect::new(0.8, 0.4, 0.1, 0.2),
        }
    }

    fn controller(dir: &Path) -> Controller {
        let store = LayoutStore::new(dir);
        let active = store.last_used_path();
        Controller::new(layout(), store, active, RecognizerConfig::default())
    }

    // index tip at (x, y), only the index finger up
    fn pointing_at(x: i32, y: i32) -> HandLandmarks {
        let mut points = vec![Point2::new(x, y + 80); 21];
        for (pip, tip) in [(6, 8), (10, 12), (14, 16), (18, 20)] {
            points[pip] = Point2::new(x, y + 40);
            points[tip] = Point2::new(x, y + 60);
        }
        points[8] = Point2::new(x, y);
        HandLandmarks::new(points)
    }

    #[test]
    fn key_bindings_follow_modes() {
        let tracking = EditorModes::default();
        let moving = EditorModes {
            config: true,
            resize: false,
        };
        let resizing = EditorModes {
            config: true,
            resize: true,
        };

        assert_eq!(command_for_key('c', tracking), Some(Command::EnterConfig));
        assert_eq!(command_for_key('c', moving), None);
        assert_eq!(command_for_key('c', resizing), Some(Command::ExitResize));
        assert_eq!(command_for_key('r', moving), Some(Command::EnterResize));
        assert_eq!(command_for_key('r', resizing), None);
        assert_eq!(command_for_key('r', tracking), None);
        assert_eq!(command_for_key('p', tracking), None);
        assert_eq!(command_for_key('p', moving), Some(Command::BeginSaveAs));
        assert_eq!(command_for_key('o', resizing), Some(Command::Overwrite));
        assert_eq!(command_for_key('Q', tracking), Some(Command::Quit));
    }

    #[test]
    fn tracking_mode_emits_actions() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        let t0 = Instant::now();

        let report = c.step(1000, 1000, Some(&pointing_at(500, 500)), t0);
        assert_eq!(report.zones.center, crate::geometry::AbsRect::new(400, 400, 200, 200));
        assert!(c.is_armed());

        let report = c.step(1000, 1000, Some(&pointing_at(850, 500)), t0 + Duration::from_secs(1));
        assert_eq!(report.action, Some(SlideAction::NextSlide));
    }

    #[test]
    fn armed_highlight_hidden_while_editing() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        c.step(1000, 1000, Some(&pointing_at(500, 500)), Instant::now());
        assert!(c.shows_armed());

        c.execute(Command::EnterConfig).unwrap();
        assert!(c.is_armed());
        assert!(!c.shows_armed());
    }

    #[test]
    fn config_mode_skips_recognizer() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        c.execute(Command::EnterConfig).unwrap();
        let report = c.step(1000, 1000, Some(&pointing_at(500, 500)), Instant::now());
        assert_eq!(report.action, None);
        assert!(!c.is_armed());
        assert!(c.status_text().unwrap().starts_with("CONFIG (MOVE)"));
    }

    #[test]
    fn pointer_edits_only_in_config_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        c.pointer(PointerEvent::Down(RelPoint::new(0.5, 0.5)));
        c.pointer(PointerEvent::Move(RelPoint::new(0.6, 0.5)));
        assert_eq!(*c.layout(), layout());

        c.execute(Command::EnterConfig).unwrap();
        c.pointer(PointerEvent::Down(RelPoint::new(0.5, 0.5)));
        c.pointer(PointerEvent::Move(RelPoint::new(0.6, 0.5)));
        c.pointer(PointerEvent::Up);
        assert!((c.layout().center.x - 0.5).abs() < 1e-9);
    }

    #[test]
    fn save_as_twice_picks_new_names_and_exits_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());

        c.execute(Command::EnterConfig).unwrap();
        c.execute(Command::EnterResize).unwrap();
        assert_eq!(c.execute(Command::BeginSaveAs).unwrap(), Outcome::PromptName);
        let first = c.execute(Command::SaveAs("layout".into())).unwrap();
        assert_eq!(first, Outcome::Saved(dir.path().join("layout.json")));
        assert_eq!(c.modes(), EditorModes::default());
        assert_eq!(c.active_path(), dir.path().join("layout.json"));

        c.execute(Command::EnterConfig).unwrap();
        let second = c.execute(Command::SaveAs("  ".into())).unwrap();
        assert_eq!(second, Outcome::Saved(dir.path().join("layout_1.json")));
        assert!(dir.path().join("last_config.json").is_file());
    }

    #[test]
    fn overwrite_targets_active_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        c.execute(Command::EnterConfig).unwrap();
        let out = c.execute(Command::Overwrite).unwrap();
        assert_eq!(out, Outcome::Saved(dir.path().join("last_config.json")));
        assert!(!c.modes().config);
    }

    #[test]
    fn save_commands_ignored_while_tracking() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = controller(dir.path());
        assert_eq!(c.execute(Command::Overwrite).unwrap(), Outcome::Continue);
        assert_eq!(c.execute(Command::SaveAs("x".into())).unwrap(), Outcome::Continue);
        assert!(!dir.path().join("x.json").exists());
        assert!(c.status_text().is_none());
        assert_eq!(c.execute(Command::Quit).unwrap(), Outcome::Quit);
    }
}
