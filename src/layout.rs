// src/layout.rs - Zone store: default layout, JSON persistence and legacy migration
use crate::geometry::{AbsRect, RelRect};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Well-known file rewritten on every save and read when no layout is given.
pub const LAST_CONFIG_FILE: &str = "last_config.json";

/// Resolution requested from the camera when no layout exists yet.
pub const DEFAULT_CAMERA_SIZE: (u32, u32) = (1280, 720);

const DEFAULT_CENTER: RelRect = RelRect::new(0.44, 0.40, 0.12, 0.20);
const DEFAULT_LEFT_ORIGIN: (f64, f64) = (0.10, 0.40);
const DEFAULT_RIGHT_ORIGIN: (f64, f64) = (0.75, 0.40);
const DEFAULT_SIDE_ZONE_PX: f64 = 150.0;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("failed to access layout file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("layout file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("layout file {path} is missing `{field}`; fix or remove it")]
    MissingField { path: PathBuf, field: &'static str },
    #[error("layout file {path} has `{field}` = {value}, outside the frame")]
    OutOfRange {
        path: PathBuf,
        field: &'static str,
        value: f64,
    },
    #[error("failed to encode layout: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Center,
    Left,
    Right,
}

impl Zone {
    /// Hit-test precedence used by the editor.
    pub const ALL: [Zone; 3] = [Zone::Center, Zone::Left, Zone::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// The three detection zones in relative frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub center: RelRect,
    pub left: RelRect,
    pub right: RelRect,
}

/// The three zones in pixels for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbsZones {
    pub center: AbsRect,
    pub left: AbsRect,
    pub right: AbsRect,
}

impl Layout {
    /// Built-in layout. The side zones keep a fixed pixel footprint, so the
    /// relative result depends on the frame size passed in.
    pub fn default_for(frame_w: u32, frame_h: u32) -> Self {
        let side_w = DEFAULT_SIDE_ZONE_PX / frame_w.max(1) as f64;
        let side_h = DEFAULT_SIDE_ZONE_PX / frame_h.max(1) as f64;
        Self {
            center: DEFAULT_CENTER,
            left: RelRect::new(DEFAULT_LEFT_ORIGIN.0, DEFAULT_LEFT_ORIGIN.1, side_w, side_h),
            right: RelRect::new(DEFAULT_RIGHT_ORIGIN.0, DEFAULT_RIGHT_ORIGIN.1, side_w, side_h),
        }
    }

    pub fn zone(&self, zone: Zone) -> &RelRect {
        match zone {
            Zone::Center => &self.center,
            Zone::Left => &self.left,
            Zone::Right => &self.right,
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> &mut RelRect {
        match zone {
            Zone::Center => &mut self.center,
            Zone::Left => &mut self.left,
            Zone::Right => &mut self.right,
        }
    }

    pub fn to_absolute(&self, width: u32, height: u32) -> AbsZones {
        AbsZones {
            center: self.center.to_absolute(width, height),
            left: self.left.to_absolute(width, height),
            right: self.right.to_absolute(width, height),
        }
    }
}

#[derive(Serialize)]
struct LayoutFile {
    center_rect: [f64; 4],
    left_rect: [f64; 4],
    right_rect: [f64; 4],
}

// Read side also accepts the old `center` + `radius` circle shape.
#[derive(Deserialize)]
struct RawLayoutFile {
    center_rect: Option<[f64; 4]>,
    center: Option<[f64; 2]>,
    radius: Option<f64>,
    left_rect: Option<[f64; 4]>,
    right_rect: Option<[f64; 4]>,
}

impl From<&Layout> for LayoutFile {
    fn from(layout: &Layout) -> Self {
        Self {
            center_rect: layout.center.to_array(),
            left_rect: layout.left.to_array(),
            right_rect: layout.right.to_array(),
        }
    }
}

/// Parses a layout document, migrating the legacy circle format.
pub fn parse_layout(json: &str, path: &Path) -> Result<Layout, LayoutError> {
    let raw: RawLayoutFile = serde_json::from_str(json).map_err(|source| LayoutError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let missing = |field| LayoutError::MissingField {
        path: path.to_path_buf(),
        field,
    };

    let center = match (raw.center_rect, raw.center, raw.radius) {
        (Some(rect), _, _) => RelRect::from(rect),
        (None, Some([cx, cy]), Some(r)) => {
            info!("Migrated old circle layout in {} to a rectangle", path.display());
            RelRect::new(cx - r, cy - r, 2.0 * r, 2.0 * r)
        }
        _ => return Err(missing("center_rect")),
    };
    let left = RelRect::from(raw.left_rect.ok_or_else(|| missing("left_rect"))?);
    let right = RelRect::from(raw.right_rect.ok_or_else(|| missing("right_rect"))?);

    check_range(&center, "center_rect", path)?;
    check_range(&left, "left_rect", path)?;
    check_range(&right, "right_rect", path)?;

    Ok(Layout {
        center,
        left,
        right,
    })
}

/// Sizes must lie in [0,1]. Origins may go down to -1 because a migrated
/// circle near the frame edge starts outside it.
fn check_range(rect: &RelRect, field: &'static str, path: &Path) -> Result<(), LayoutError> {
    let origin_ok = |v: f64| (-1.0..=1.0).contains(&v);
    let size_ok = |v: f64| (0.0..=1.0).contains(&v);

    let checks = [
        (rect.x, origin_ok(rect.x)),
        (rect.y, origin_ok(rect.y)),
        (rect.w, size_ok(rect.w)),
        (rect.h, size_ok(rect.h)),
    ];
    match checks.into_iter().find(|&(_, ok)| !ok) {
        Some((value, _)) => Err(LayoutError::OutOfRange {
            path: path.to_path_buf(),
            field,
            value,
        }),
        None => Ok(()),
    }
}

/// Reads and writes layout files relative to a base directory.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    dir: PathBuf,
}

impl LayoutStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn last_used_path(&self) -> PathBuf {
        self.dir.join(LAST_CONFIG_FILE)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// The requested file when it exists, otherwise the last-used file.
    pub fn load_candidate(&self, requested: Option<&Path>) -> PathBuf {
        requested
            .map(|p| self.resolve(p))
            .filter(|p| p.is_file())
            .unwrap_or_else(|| self.last_used_path())
    }

    /// `Ok(None)` when neither the requested nor the last-used file exists.
    pub fn load(&self, requested: Option<&Path>) -> Result<Option<Layout>, LayoutError> {
        let candidate = self.load_candidate(requested);
        if !candidate.is_file() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(&candidate).map_err(|source| LayoutError::Io {
            path: candidate.clone(),
            source,
        })?;
        let layout = parse_layout(&json, &candidate)?;
        info!("Loaded layout from {}", candidate.display());
        Ok(Some(layout))
    }

    /// Writes `layout` and mirrors it into the last-used file. Without
    /// `overwrite`, an existing target gets a `_N` suffix before the extension.
    /// Returns the path actually written.
    pub fn persist(
        &self,
        layout: &Layout,
        target: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, LayoutError> {
        let mut path = self.resolve(&with_json_extension(target));
        if !overwrite && path.exists() {
            path = next_free_path(&path);
        }

        let json = serde_json::to_string_pretty(&LayoutFile::from(layout))?;
        write_file(&path, &json)?;
        write_file(&self.last_used_path(), &json)?;

        info!("Layout saved to {}", path.display());
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), LayoutError> {
    std::fs::write(path, contents).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn with_json_extension(path: &Path) -> PathBuf {
    if path.to_string_lossy().ends_with(".json") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    }
}

/// First `stem_N.ext` (N = 1, 2, ...) that does not exist yet.
pub fn next_free_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| path.with_file_name(format!("{}_{}{}", stem, n, ext)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: &RelRect, b: &RelRect) -> bool {
        let eps = 1e-9;
        (a.x - b.x).abs() < eps
            && (a.y - b.y).abs() < eps
            && (a.w - b.w).abs() < eps
            && (a.h - b.h).abs() < eps
    }

    fn sample_layout() -> Layout {
        Layout {
            center: RelRect::new(0.3, 0.35, 0.2, 0.25),
            left: RelRect::new(0.05, 0.4, 0.1, 0.15),
            right: RelRect::new(0.8, 0.45, 0.12, 0.18),
        }
    }

    #[test]
    fn default_side_zones_follow_frame_size() {
        let hd = Layout::default_for(1280, 720);
        assert_eq!(hd.center, RelRect::new(0.44, 0.40, 0.12, 0.20));
        assert!((hd.left.w - 150.0 / 1280.0).abs() < 1e-12);
        assert!((hd.left.h - 150.0 / 720.0).abs() < 1e-12);
        assert_eq!(hd.left.x, 0.10);
        assert_eq!(hd.right.x, 0.75);

        let vga = Layout::default_for(640, 480);
        assert!(vga.left.w > hd.left.w);
        assert_eq!(vga.left.w, vga.right.w);
    }

    #[test]
    fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path());
        let layout = sample_layout();

        let written = store.persist(&layout, Path::new("talk"), false).unwrap();
        assert_eq!(written, dir.path().join("talk.json"));

        let loaded = store.load(Some(&written)).unwrap().unwrap();
        assert!(approx_eq(&loaded.center, &layout.center));
        assert!(approx_eq(&loaded.left, &layout.left));
        assert!(approx_eq(&loaded.right, &layout.right));
    }

    #[test]
    fn save_without_overwrite_never_clobbers() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path());
        let first = sample_layout();
        let mut second = first;
        second.center.x = 0.1;

        let a = store.persist(&first, Path::new("layout"), false).unwrap();
        let b = store.persist(&second, Path::new("layout"), false).unwrap();
        let c = store.persist(&second, Path::new("layout.json"), false).unwrap();

        assert_eq!(a, dir.path().join("layout.json"));
        assert_eq!(b, dir.path().join("layout_1.json"));
        assert_eq!(c, dir.path().join("layout_2.json"));

        let kept = store.load(Some(&a)).unwrap().unwrap();
        assert!(approx_eq(&kept.center, &first.center));
    }

    #[test]
    fn overwrite_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path());
        let mut layout = sample_layout();

        let path = store.persist(&layout, Path::new("deck"), false).unwrap();
        layout.right.y = 0.05;
        let again = store.persist(&layout, &path, true).unwrap();

        assert_eq!(path, again);
        assert!(!dir.path().join("deck_1.json").exists());
        let loaded = store.load(Some(&path)).unwrap().unwrap();
        assert!(approx_eq(&loaded.right, &layout.right));
    }

    #[test]
    fn every_save_refreshes_last_used_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path());
        let mut layout = sample_layout();
        store.persist(&layout, Path::new("one"), false).unwrap();
        layout.left.x = 0.0;
        store.persist(&layout, Path::new("two"), false).unwrap();

        let fallback = store.load(None).unwrap().unwrap();
        assert!(approx_eq(&fallback.left, &layout.left));
    }

    #[test]
    fn missing_requested_path_falls_back_to_last_used() {
        let dir = tempfile::tempdir().unwrap();
        let store = LayoutStore::new(dir.path());
        assert!(store.load(Some(Path::new("nope.json"))).unwrap().is_none());

        store.persist(&sample_layout(), Path::new("x"), false).unwrap();
        assert_eq!(
            store.load_candidate(Some(Path::new("nope.json"))),
            store.last_used_path()
        );
        assert!(store.load(Some(Path::new("nope.json"))).unwrap().is_some());
    }

    #[test]
    fn legacy_circle_is_migrated() {
        let json = r#"{ "center": [0.5, 0.5], "radius": 0.1,
                        "left_rect": [0.1, 0.4, 0.1, 0.2],
                        "right_rect": [0.75, 0.4, 0.1, 0.2] }"#;
        let layout = parse_layout(json, Path::new("old.json")).unwrap();
        assert!(approx_eq(&layout.center, &RelRect::new(0.4, 0.4, 0.2, 0.2)));
        assert!(approx_eq(&layout.left, &RelRect::new(0.1, 0.4, 0.1, 0.2)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let json = r#"{ "center_rect": [0.5, 0.5, 1e12, 0.1],
                        "left_rect": [0.1, 0.4, 0.1, 0.2],
                        "right_rect": [0.75, 0.4, 0.1, 0.2] }"#;
        match parse_layout(json, Path::new("huge.json")) {
            Err(LayoutError::OutOfRange { field, value, .. }) => {
                assert_eq!(field, "center_rect");
                assert_eq!(value, 1e12);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }

        let negative = r#"{ "center_rect": [0.4, 0.4, 0.2, 0.2],
                            "left_rect": [0.1, 0.4, -0.1, 0.2],
                            "right_rect": [0.75, 0.4, 0.1, 0.2] }"#;
        assert!(matches!(
            parse_layout(negative, Path::new("neg.json")),
            Err(LayoutError::OutOfRange { field: "left_rect", .. })
        ));

        let far = r#"{ "center_rect": [0.4, 0.4, 0.2, 0.2],
                       "left_rect": [0.1, 0.4, 0.1, 0.2],
                       "right_rect": [5.0, 0.4, 0.1, 0.2] }"#;
        assert!(matches!(
            parse_layout(far, Path::new("far.json")),
            Err(LayoutError::OutOfRange { field: "right_rect", .. })
        ));
    }

    #[test]
    fn legacy_circle_at_frame_edge_keeps_negative_origin() {
        let json = r#"{ "center": [0.05, 0.5], "radius": 0.1,
                        "left_rect": [0.1, 0.4, 0.1, 0.2],
                        "right_rect": [0.75, 0.4, 0.1, 0.2] }"#;
        let layout = parse_layout(json, Path::new("edge.json")).unwrap();
        assert!((layout.center.x + 0.05).abs() < 1e-9);
    }

    #[test]
    fn rect_format_wins_over_legacy_fields() {
        let json = r#"{ "center_rect": [0.1, 0.1, 0.1, 0.1],
                        "center": [0.5, 0.5], "radius": 0.1,
                        "left_rect": [0.1, 0.4, 0.1, 0.2],
                        "right_rect": [0.75, 0.4, 0.1, 0.2] }"#;
        let layout = parse_layout(json, Path::new("mixed.json")).unwrap();
        assert_eq!(layout.center, RelRect::new(0.1, 0.1, 0.1, 0.1));
    }

    #[test]
    fn invalid_documents_are_errors() {
        let no_side = r#"{ "center_rect": [0.1, 0.1, 0.1, 0.1] }"#;
        assert!(matches!(
            parse_layout(no_side, Path::new("a.json")),
            Err(LayoutError::MissingField { field: "left_rect", .. })
        ));

        let no_center = r#"{ "left_rect": [0.1, 0.4, 0.1, 0.2], "right_rect": [0.7, 0.4, 0.1, 0.2] }"#;
        assert!(matches!(
            parse_layout(no_center, Path::new("b.json")),
            Err(LayoutError::MissingField { field: "center_rect", .. })
        ));

        assert!(matches!(
            parse_layout("not json", Path::new("c.json")),
            Err(LayoutError::Parse { .. })
        ));
    }

    #[test]
    fn collision_suffix_goes_before_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("slides.json");
        assert_eq!(next_free_path(&base), dir.path().join("slides_1.json"));
        std::fs::write(dir.path().join("slides_1.json"), "{}").unwrap();
        assert_eq!(next_free_path(&base), dir.path().join("slides_2.json"));
        assert_eq!(with_json_extension(Path::new("a")), PathBuf::from("a.json"));
        assert_eq!(with_json_extension(Path::new("a.json")), PathBuf::from("a.json"));
    }
}
